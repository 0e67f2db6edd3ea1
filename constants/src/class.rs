/// ASPRS LAS classification codes emitted by the synthesizer
pub const GROUND: u8 = 2;
pub const VEGETATION: u8 = 5;
pub const WIRE: u8 = 14;
pub const TOWER: u8 = 15;

/// Fixed output order of the assembled point cloud
pub const ASSEMBLY_ORDER: [u8; 4] = [GROUND, VEGETATION, WIRE, TOWER];

pub struct ClassInfo {
    pub id: u8,
    pub name: &'static str,
}

pub const CLASS_MAP: &[ClassInfo] = &[
    ClassInfo {
        id: 0,
        name: "unclassified",
    },
    ClassInfo {
        id: GROUND,
        name: "ground",
    },
    ClassInfo {
        id: VEGETATION,
        name: "vegetation - high",
    },
    ClassInfo {
        id: WIRE,
        name: "wire - conductor",
    },
    ClassInfo {
        id: TOWER,
        name: "transmission tower",
    },
];

pub fn get_class_name(id: u8) -> String {
    CLASS_MAP
        .iter()
        .find(|c| c.id == id)
        .map_or("unknown", |c| c.name)
        .to_string()
}
