//! Static stat tables for units, cities and city improvements

use crate::resources::Resources;
use serde::{Deserialize, Serialize};

/// Mobile combatant kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Warrior,
    Cavalry,
    Archer,
    Crossbowman,
}

/// Stationary combatant kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    City,
}

/// City-level upgrades; each can be completed once per city
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementKind {
    Farm,
    Mine,
    Barracks,
}

/// Unit stat block
#[derive(Clone, Debug)]
pub struct UnitBlueprint {
    pub kind: UnitKind,
    /// Type tag in save files
    pub type_name: &'static str,
    /// Short id used in commands
    pub id: &'static str,
    pub name: &'static str,
    pub health: i32,
    pub damage: i32,
    pub damage_spread: i32,
    pub attack_range: u32,
    pub movement_range: u32,
    pub cost: Resources,
    pub recruit_time: u32,
    pub requires: Option<ImprovementKind>,
}

/// City stat block
#[derive(Clone, Debug)]
pub struct CityBlueprint {
    pub kind: BuildingKind,
    pub type_name: &'static str,
    pub name: &'static str,
    pub health: i32,
    pub damage: i32,
    pub damage_spread: i32,
    pub defense: i32,
    pub attack_range: u32,
    pub founding_cost: Resources,
    /// Per-round yield before improvements
    pub base_yield: Resources,
    pub food_storage: u32,
}

/// Improvement stat block
#[derive(Clone, Debug)]
pub struct ImprovementBlueprint {
    pub kind: ImprovementKind,
    pub id: &'static str,
    pub name: &'static str,
    pub build_time: u32,
    pub cost: Resources,
    /// Per-round yield added to the city
    pub yields: Resources,
    pub extra_storage: u32,
}

pub static UNIT_BLUEPRINTS: [UnitBlueprint; 4] = [
    UnitBlueprint {
        kind: UnitKind::Warrior,
        type_name: "Warrior",
        id: "warrior",
        name: "Warrior",
        health: 100,
        damage: 30,
        damage_spread: 5,
        attack_range: 1,
        movement_range: 3,
        cost: Resources::new(50, 0, 0, 0, 10),
        recruit_time: 2,
        requires: None,
    },
    UnitBlueprint {
        kind: UnitKind::Cavalry,
        type_name: "Cavalry",
        id: "cavalry",
        name: "Cavalry",
        health: 90,
        damage: 35,
        damage_spread: 7,
        attack_range: 1,
        movement_range: 5,
        cost: Resources::new(80, 0, 0, 0, 20),
        recruit_time: 3,
        requires: Some(ImprovementKind::Barracks),
    },
    UnitBlueprint {
        kind: UnitKind::Archer,
        type_name: "Archer",
        id: "archer",
        name: "Archer",
        health: 70,
        damage: 25,
        damage_spread: 5,
        attack_range: 3,
        movement_range: 2,
        cost: Resources::new(60, 0, 0, 0, 15),
        recruit_time: 2,
        requires: Some(ImprovementKind::Barracks),
    },
    UnitBlueprint {
        kind: UnitKind::Crossbowman,
        type_name: "Crossbowman",
        id: "crossbowman",
        name: "Crossbowman",
        health: 75,
        damage: 30,
        damage_spread: 4,
        attack_range: 3,
        movement_range: 2,
        cost: Resources::new(70, 0, 0, 0, 18),
        recruit_time: 3,
        requires: Some(ImprovementKind::Barracks),
    },
];

pub static CITY_BLUEPRINT: CityBlueprint = CityBlueprint {
    kind: BuildingKind::City,
    type_name: "City",
    name: "City",
    health: 200,
    // 8..=40 per hit
    damage: 24,
    damage_spread: 16,
    defense: 8,
    attack_range: 4,
    founding_cost: Resources::new(300, 150, 100, 0, 0),
    base_yield: Resources::new(10, 5, 0, 0, 3),
    food_storage: 100,
};

pub static IMPROVEMENT_BLUEPRINTS: [ImprovementBlueprint; 3] = [
    ImprovementBlueprint {
        kind: ImprovementKind::Farm,
        id: "farm",
        name: "Farm",
        build_time: 3,
        cost: Resources::new(100, 50, 20, 0, 0),
        yields: Resources::food(10),
        extra_storage: 50,
    },
    ImprovementBlueprint {
        kind: ImprovementKind::Mine,
        id: "mine",
        name: "Mine",
        build_time: 4,
        cost: Resources::new(120, 30, 80, 0, 0),
        yields: Resources::new(20, 0, 5, 0, 0),
        extra_storage: 0,
    },
    ImprovementBlueprint {
        kind: ImprovementKind::Barracks,
        id: "barracks",
        name: "Barracks",
        build_time: 5,
        cost: Resources::new(150, 70, 0, 0, 0),
        yields: Resources::ZERO,
        extra_storage: 0,
    },
];

impl UnitKind {
    pub const ALL: [UnitKind; 4] = [
        UnitKind::Warrior,
        UnitKind::Cavalry,
        UnitKind::Archer,
        UnitKind::Crossbowman,
    ];

    pub fn blueprint(self) -> &'static UnitBlueprint {
        &UNIT_BLUEPRINTS[self as usize]
    }

    /// Parse a save-file type tag ("Warrior")
    pub fn from_type_name(name: &str) -> Option<Self> {
        UNIT_BLUEPRINTS
            .iter()
            .find(|bp| bp.type_name == name)
            .map(|bp| bp.kind)
    }

    /// Parse a command id ("warrior")
    pub fn from_id(id: &str) -> Option<Self> {
        UNIT_BLUEPRINTS.iter().find(|bp| bp.id == id).map(|bp| bp.kind)
    }
}

impl BuildingKind {
    pub fn blueprint(self) -> &'static CityBlueprint {
        match self {
            BuildingKind::City => &CITY_BLUEPRINT,
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        (name == CITY_BLUEPRINT.type_name).then_some(BuildingKind::City)
    }
}

impl ImprovementKind {
    pub const ALL: [ImprovementKind; 3] = [
        ImprovementKind::Farm,
        ImprovementKind::Mine,
        ImprovementKind::Barracks,
    ];

    pub fn blueprint(self) -> &'static ImprovementBlueprint {
        &IMPROVEMENT_BLUEPRINTS[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.blueprint().id
    }

    pub fn from_id(id: &str) -> Option<Self> {
        IMPROVEMENT_BLUEPRINTS
            .iter()
            .find(|bp| bp.id == id)
            .map(|bp| bp.kind)
    }
}
