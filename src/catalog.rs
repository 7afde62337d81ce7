//! Static reference data for every field and animal pen the game offers.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldInfo {
    pub name: &'static str,
    /// Square metres.
    pub area: f64,
    pub price: u64,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalInfo {
    pub int_name: &'static str,
    pub display_name: &'static str,
    pub feed_type: &'static str,
}

const fn field(name: &'static str, area: f64, price: u64, level: u32) -> FieldInfo {
    FieldInfo {
        name,
        area,
        price,
        level,
    }
}

const fn animal(
    int_name: &'static str,
    display_name: &'static str,
    feed_type: &'static str,
) -> AnimalInfo {
    AnimalInfo {
        int_name,
        display_name,
        feed_type,
    }
}

pub const FIELDS: &[FieldInfo] = &[
    field("Box", 1907.0, 30_000, 1),
    field("Pressure", 2024.0, 70_000, 5),
    field("Cable", 2175.0, 100_000, 15),
    field("Pencil", 2419.0, 150_000, 20),
    field("Chocolate", 2744.0, 190_000, 25),
    field("Boom", 3271.0, 200_000, 30),
    field("Controller", 3393.0, 300_000, 35),
    field("Coffee", 3652.0, 500_000, 40),
    field("Tango", 3859.0, 750_000, 45),
    field("Syringe", 3954.0, 1_000_000, 50),
    field("Screw", 3997.0, 1_750_000, 55),
    field("Chips", 6688.0, 3_000_000, 60),
    field("Wire", 6750.0, 5_000_000, 65),
    field("Sport", 6911.0, 10_000_000, 70),
    field("Arizona", 7095.0, 15_000_000, 75),
    field("Liquid", 7163.0, 25_000_000, 80),
    field("Mug", 7313.0, 50_000_000, 85),
    field("Taco", 8227.0, 100_000_000, 90),
    field("Mach", 10481.0, 100_000_000, 90),
    field("Tornado", 10916.0, 105_000_000, 94),
    field("Pokemon", 10973.0, 150_000_000, 95),
    field("Temp", 11182.0, 200_000_000, 100),
    field("Pipe", 15766.0, 250_000_000, 105),
    field("Lamp", 32022.0, 275_000_000, 110),
    field("Socket", 41077.0, 300_000_000, 115),
];

pub const ANIMALS: &[AnimalInfo] = &[
    animal("farm_chickens", "Chickens", "Carrot Seeds"),
    animal("farm_pig", "Pigs", "Potatoes"),
    animal("farm_cows_small", "Cows (Small)", "Wheat"),
    animal("farm_cows_medium", "Cows (Medium)", "Wheat"),
    animal("farm_cows_large", "Cows (Large)", "Wheat"),
];

#[cfg(test)]
mod tests {
    use super::{ANIMALS, FIELDS};

    #[test]
    fn identifiers_are_unique() {
        for (i, a) in FIELDS.iter().enumerate() {
            assert!(FIELDS[i + 1..].iter().all(|b| b.name != a.name));
        }
        for (i, a) in ANIMALS.iter().enumerate() {
            assert!(ANIMALS[i + 1..].iter().all(|b| b.int_name != a.int_name));
        }
    }
}
