//! Monster schema, ditulis tangan dengan bentuk yang sama seperti
//! output code generator:
//!
//! ```text
//! struct Vec3 { x: float; y: float; z: float; }
//! table Weapon { name: string; damage: short; }
//! union Equipment { Weapon, Nickname: string }
//! table Monster {
//!   pos: Vec3; mana: short = 150; hp: short = 100; name: string (required);
//!   inventory: [ubyte]; color: ubyte = Blue; weapons: [Weapon];
//!   equipped: Equipment; path: [Vec3];
//!   testnestedflatbuffer: [ubyte] (nested_flatbuffer: "Monster");
//!   friends: [string]; enemy: Monster;
//! }
//! root_type Monster; file_identifier "MONS";
//! ```

#![allow(dead_code)]

use flatwire::core::{read_scalar_at, write_scalar_at};
use flatwire::protocol::{
    field_slot, kind, root_table, Builder, InlineStruct, Offset, StructElem, Table, VOffset,
    Vector,
};
use flatwire::verify::{Result, Verifiable, Verifier};

pub const MONSTER_IDENTIFIER: &str = "MONS";

pub const COLOR_RED: u8 = 0;
pub const COLOR_GREEN: u8 = 1;
pub const COLOR_BLUE: u8 = 2;

pub const EQUIPMENT_NONE: u8 = 0;
pub const EQUIPMENT_WEAPON: u8 = 1;
pub const EQUIPMENT_NICKNAME: u8 = 2;

// ----------------------------------------------------------------------
// Vec3
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl InlineStruct for Vec3 {
    const SIZE: usize = 12;
    const ALIGN: usize = 4;

    fn write_to(&self, dst: &mut [u8]) {
        write_scalar_at(dst, 0, self.x);
        write_scalar_at(dst, 4, self.y);
        write_scalar_at(dst, 8, self.z);
    }

    fn read_from(src: &[u8]) -> Self {
        Self {
            x: read_scalar_at(src, 0),
            y: read_scalar_at(src, 4),
            z: read_scalar_at(src, 8),
        }
    }
}

// ----------------------------------------------------------------------
// Weapon
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Weapon<'a> {
    table: Table<'a>,
}

impl<'a> Weapon<'a> {
    pub const VT_NAME: VOffset = field_slot(0);
    pub const VT_DAMAGE: VOffset = field_slot(1);

    pub fn init(table: Table<'a>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    pub fn name(&self) -> Option<&'a str> {
        self.table.get_str(Self::VT_NAME)
    }

    pub fn damage(&self) -> i16 {
        self.table.get(Self::VT_DAMAGE, 0)
    }
}

impl Verifiable for Weapon<'_> {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.visit_table(pos)?
            .visit_string("name", Self::VT_NAME, false)?
            .visit_field::<i16>("damage", Self::VT_DAMAGE, false)?
            .finish();
        Ok(())
    }
}

pub fn create_weapon(
    b: &mut Builder,
    name: Option<Offset<kind::String>>,
    damage: i16,
) -> Offset<kind::Table> {
    b.start_table(2);
    if let Some(name) = name {
        b.push_slot_offset(Weapon::VT_NAME, name);
    }
    b.push_slot::<i16>(Weapon::VT_DAMAGE, damage, 0);
    b.end_table()
}

// ----------------------------------------------------------------------
// Monster
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Monster<'a> {
    table: Table<'a>,
}

impl<'a> Monster<'a> {
    pub const VT_POS: VOffset = field_slot(0);
    pub const VT_MANA: VOffset = field_slot(1);
    pub const VT_HP: VOffset = field_slot(2);
    pub const VT_NAME: VOffset = field_slot(3);
    pub const VT_INVENTORY: VOffset = field_slot(4);
    pub const VT_COLOR: VOffset = field_slot(5);
    pub const VT_WEAPONS: VOffset = field_slot(6);
    pub const VT_EQUIPPED_TYPE: VOffset = field_slot(7);
    pub const VT_EQUIPPED: VOffset = field_slot(8);
    pub const VT_PATH: VOffset = field_slot(9);
    pub const VT_TESTNESTEDFLATBUFFER: VOffset = field_slot(10);
    pub const VT_FRIENDS: VOffset = field_slot(11);
    pub const VT_ENEMY: VOffset = field_slot(12);

    pub const NUM_FIELDS: usize = 13;

    pub fn init(table: Table<'a>) -> Self {
        Self { table }
    }

    /// Root tanpa verifikasi (trusted buffer)
    pub fn root(buf: &'a [u8]) -> Self {
        Self::init(root_table(buf))
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    pub fn pos(&self) -> Option<Vec3> {
        self.table.get_struct(Self::VT_POS)
    }

    pub fn mana(&self) -> i16 {
        self.table.get(Self::VT_MANA, 150)
    }

    pub fn hp(&self) -> i16 {
        self.table.get(Self::VT_HP, 100)
    }

    /// Required, jadi selalu ada di buffer yang lolos verifier
    pub fn name(&self) -> &'a str {
        self.table.get_str(Self::VT_NAME).unwrap_or_default()
    }

    pub fn inventory(&self) -> Option<Vector<'a, u8>> {
        self.table.get_vector(Self::VT_INVENTORY)
    }

    pub fn color(&self) -> u8 {
        self.table.get(Self::VT_COLOR, COLOR_BLUE)
    }

    pub fn weapons(&self) -> Option<Vector<'a, Table<'a>>> {
        self.table.get_vector(Self::VT_WEAPONS)
    }

    pub fn equipped_type(&self) -> u8 {
        self.table.get_union_type(Self::VT_EQUIPPED_TYPE)
    }

    pub fn equipped_as_weapon(&self) -> Option<Weapon<'a>> {
        if self.equipped_type() == EQUIPMENT_WEAPON {
            self.table.get_union(Self::VT_EQUIPPED).map(Weapon::init)
        } else {
            None
        }
    }

    pub fn equipped_as_nickname(&self) -> Option<&'a str> {
        if self.equipped_type() == EQUIPMENT_NICKNAME {
            self.table.get_union_str(Self::VT_EQUIPPED)
        } else {
            None
        }
    }

    pub fn path(&self) -> Option<Vector<'a, StructElem<Vec3>>> {
        self.table.get_vector(Self::VT_PATH)
    }

    pub fn testnestedflatbuffer(&self) -> Option<&'a [u8]> {
        self.table.get_bytes(Self::VT_TESTNESTEDFLATBUFFER)
    }

    pub fn testnestedflatbuffer_nested(&self) -> Option<Monster<'a>> {
        self.testnestedflatbuffer().map(Monster::root)
    }

    pub fn friends(&self) -> Option<Vector<'a, &'a str>> {
        self.table.get_vector(Self::VT_FRIENDS)
    }

    pub fn enemy(&self) -> Option<Monster<'a>> {
        self.table.get_table(Self::VT_ENEMY).map(Monster::init)
    }
}

impl Verifiable for Monster<'_> {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()> {
        v.visit_table(pos)?
            .visit_struct("pos", Self::VT_POS, Vec3::SIZE, Vec3::ALIGN, false)?
            .visit_field::<i16>("mana", Self::VT_MANA, false)?
            .visit_field::<i16>("hp", Self::VT_HP, false)?
            .visit_string("name", Self::VT_NAME, true)?
            .visit_vector::<u8>("inventory", Self::VT_INVENTORY, false)?
            .visit_field::<u8>("color", Self::VT_COLOR, false)?
            .visit_vector_of_tables::<Weapon>("weapons", Self::VT_WEAPONS, false)?
            .visit_union(
                "equipped_type",
                Self::VT_EQUIPPED_TYPE,
                "equipped",
                Self::VT_EQUIPPED,
                false,
                |type_id, v, pos| match type_id {
                    EQUIPMENT_WEAPON => v.verify_union_variant::<Weapon>("Equipment::Weapon", pos),
                    EQUIPMENT_NICKNAME => v.verify_union_string("Equipment::Nickname", pos),
                    _ => Ok(()),
                },
            )?
            .visit_vector_of_structs("path", Self::VT_PATH, Vec3::SIZE, Vec3::ALIGN, false)?
            .visit_nested_buffer::<Monster>(
                "testnestedflatbuffer",
                Self::VT_TESTNESTEDFLATBUFFER,
                false,
            )?
            .visit_vector_of_strings("friends", Self::VT_FRIENDS, false)?
            .visit_table::<Monster>("enemy", Self::VT_ENEMY, false)?
            .finish();
        Ok(())
    }
}

pub struct MonsterArgs {
    pub pos: Option<Vec3>,
    pub mana: i16,
    pub hp: i16,
    pub name: Option<Offset<kind::String>>,
    pub inventory: Option<Offset<kind::Vector>>,
    pub color: u8,
    pub weapons: Option<Offset<kind::Vector>>,
    pub equipped_type: u8,
    pub equipped: Option<Offset<kind::Union>>,
    pub path: Option<Offset<kind::Vector>>,
    pub testnestedflatbuffer: Option<Offset<kind::Vector>>,
    pub friends: Option<Offset<kind::Vector>>,
    pub enemy: Option<Offset<kind::Table>>,
}

impl Default for MonsterArgs {
    fn default() -> Self {
        Self {
            pos: None,
            mana: 150,
            hp: 100,
            name: None,
            inventory: None,
            color: COLOR_BLUE,
            weapons: None,
            equipped_type: EQUIPMENT_NONE,
            equipped: None,
            path: None,
            testnestedflatbuffer: None,
            friends: None,
            enemy: None,
        }
    }
}

/// Offset dulu, lalu struct, lalu scalar dari yang terbesar
///
/// # Panics
/// Panic jika `name` tidak di-set (required)
pub fn create_monster(b: &mut Builder, args: &MonsterArgs) -> Offset<kind::Table> {
    b.start_table(Monster::NUM_FIELDS);
    if let Some(x) = args.enemy {
        b.push_slot_offset(Monster::VT_ENEMY, x);
    }
    if let Some(x) = args.friends {
        b.push_slot_offset(Monster::VT_FRIENDS, x);
    }
    if let Some(x) = args.testnestedflatbuffer {
        b.push_slot_offset(Monster::VT_TESTNESTEDFLATBUFFER, x);
    }
    if let Some(x) = args.path {
        b.push_slot_offset(Monster::VT_PATH, x);
    }
    if let Some(x) = args.equipped {
        b.push_slot_offset(Monster::VT_EQUIPPED, x);
    }
    if let Some(x) = args.weapons {
        b.push_slot_offset(Monster::VT_WEAPONS, x);
    }
    if let Some(x) = args.inventory {
        b.push_slot_offset(Monster::VT_INVENTORY, x);
    }
    if let Some(x) = args.name {
        b.push_slot_offset(Monster::VT_NAME, x);
    }
    if let Some(pos) = &args.pos {
        let s = b.create_struct(pos);
        b.push_slot_struct(Monster::VT_POS, s);
    }
    b.push_slot::<i16>(Monster::VT_HP, args.hp, 100);
    b.push_slot::<i16>(Monster::VT_MANA, args.mana, 150);
    b.push_slot::<u8>(Monster::VT_EQUIPPED_TYPE, args.equipped_type, EQUIPMENT_NONE);
    b.push_slot::<u8>(Monster::VT_COLOR, args.color, COLOR_BLUE);

    let m = b.end_table();
    b.required(m, Monster::VT_NAME, "name");
    m
}

/// Monster kecil untuk di-embed sebagai nested buffer
pub fn build_nested_monster() -> Vec<u8> {
    let mut b = Builder::new();
    let name = b.create_string("NestedMonster");
    let m = create_monster(
        &mut b,
        &MonsterArgs {
            name: Some(name),
            hp: 7,
            ..Default::default()
        },
    );
    b.finish(m, Some(MONSTER_IDENTIFIER));
    b.into_finished_vec()
}

/// Monster lengkap: semua jenis field terisi
pub fn build_orc_with_capacity(capacity: usize) -> Vec<u8> {
    let nested = build_nested_monster();

    let mut b = Builder::with_capacity(capacity);
    let nested = b.create_nested_buffer(&nested, 8);

    let enemy_name = b.create_string("Fred");
    let enemy = create_monster(
        &mut b,
        &MonsterArgs {
            name: Some(enemy_name),
            ..Default::default()
        },
    );

    let sword_name = b.create_string("Sword");
    let sword = create_weapon(&mut b, Some(sword_name), 3);
    let axe_name = b.create_string("Axe");
    let axe = create_weapon(&mut b, Some(axe_name), 5);
    let weapons = b.create_vector_of_offsets(&[sword, axe]);

    let inventory = b.create_byte_vector(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let path = b.create_vector_of_structs(&[Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
    let friends = b.create_vector_of_strings(&["Barney", "Wilma"]);
    let name = b.create_string("Orc");

    let orc = create_monster(
        &mut b,
        &MonsterArgs {
            pos: Some(Vec3::new(1.0, 2.0, 3.0)),
            hp: 300,
            name: Some(name),
            inventory: Some(inventory),
            color: COLOR_RED,
            weapons: Some(weapons),
            equipped_type: EQUIPMENT_WEAPON,
            equipped: Some(axe.cast()),
            path: Some(path),
            testnestedflatbuffer: Some(nested),
            friends: Some(friends),
            enemy: Some(enemy),
            ..Default::default()
        },
    );
    b.finish(orc, Some(MONSTER_IDENTIFIER));
    b.into_finished_vec()
}

pub fn build_orc() -> Vec<u8> {
    build_orc_with_capacity(1024)
}

/// Rantai `depth` monster lewat field `enemy`
pub fn build_enemy_chain(depth: usize) -> Vec<u8> {
    let mut b = Builder::new();
    let mut enemy = None;
    for i in 0..depth {
        let name = b.create_string(&format!("Minion{}", i));
        enemy = Some(create_monster(
            &mut b,
            &MonsterArgs {
                name: Some(name),
                enemy,
                ..Default::default()
            },
        ));
    }
    if let Some(root) = enemy {
        b.finish(root, Some(MONSTER_IDENTIFIER));
    }
    b.into_finished_vec()
}

/// Rantai `depth` monster, masing-masing membawa buffer sebelumnya
/// sebagai `testnestedflatbuffer`
pub fn build_nested_chain(depth: usize) -> Vec<u8> {
    let mut inner: Option<Vec<u8>> = None;
    for i in 0..depth {
        let mut b = Builder::new();
        let nested = inner.as_deref().map(|buf| b.create_nested_buffer(buf, 8));
        let name = b.create_string(&format!("Doll{}", i));
        let m = create_monster(
            &mut b,
            &MonsterArgs {
                name: Some(name),
                testnestedflatbuffer: nested,
                ..Default::default()
            },
        );
        b.finish(m, Some(MONSTER_IDENTIFIER));
        inner = Some(b.into_finished_vec());
    }
    inner.unwrap_or_default()
}
