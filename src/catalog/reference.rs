//! Built-in culture-media instance: four growth media blended from five raw
//! materials, 300 kg of each medium.

use std::collections::BTreeMap;

use super::{Catalog, Mixture, NutrientBounds, Resource};

const NUTRIENTS: [&str; 5] = ["Agar", "Levadura", "Peptona", "NaCl", "Fosfato"];

const TARGET_MASS_KG: f64 = 300.0;

/// (name, cost per kg, available kg, composition % in `NUTRIENTS` order)
const RESOURCES: [(&str, f64, f64, [f64; 5]); 5] = [
    ("Fosfato", 323.0, 206.0, [0.0, 0.0, 0.0, 0.0, 100.0]),
    ("Péptidos", 510.0, 641.0, [0.0, 0.0, 70.0, 0.0, 0.0]),
    ("Aminoácidos", 119.0, 120.0, [0.0, 0.0, 48.0, 0.0, 52.0]),
    ("Extracto de Levadura", 340.0, 145.0, [0.0, 76.0, 0.0, 13.0, 0.0]),
    ("Agar", 826.0, 189.0, [84.0, 0.0, 0.0, 5.0, 0.0]),
];

/// (name, min % and max % in `NUTRIENTS` order)
const MIXTURES: [(&str, [f64; 5], [f64; 5]); 4] = [
    (
        "LB",
        [8.4, 1.26, 10.22, 3.0, 0.0],
        [19.0, 22.8, 36.0, 10.0, 0.0],
    ),
    (
        "TSA",
        [4.33, 1.42, 5.3, 1.26, 0.0],
        [26.1, 15.4, 46.0, 10.0, 0.0],
    ),
    (
        "MRS",
        [1.2, 0.0, 0.8, 0.025, 0.8],
        [11.0, 0.0, 11.4, 1.0, 72.0],
    ),
    ("SDA", [0.0, 0.0, 0.5, 0.0, 0.0], [25.0, 0.0, 74.0, 0.0, 0.0]),
];

impl Catalog {
    /// The culture-media instance (LB, TSA, MRS and SDA at 300 kg each).
    pub fn reference() -> Self {
        let nutrients: Vec<String> = NUTRIENTS.iter().map(|n| n.to_string()).collect();

        let resources = RESOURCES
            .iter()
            .map(|&(name, cost_per_kg, available_kg, composition)| Resource {
                name: name.to_string(),
                cost_per_kg,
                available_kg,
                composition: nutrients.iter().cloned().zip(composition).collect(),
            })
            .collect();

        let mixtures = MIXTURES
            .iter()
            .map(|&(name, min, max)| Mixture {
                name: name.to_string(),
                target_mass_kg: TARGET_MASS_KG,
                bounds: nutrients
                    .iter()
                    .cloned()
                    .zip(min.into_iter().zip(max))
                    .map(|(nutrient, (lo, hi))| (nutrient, NutrientBounds::new(lo, hi)))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect();

        Catalog::new(nutrients, resources, mixtures)
    }
}
