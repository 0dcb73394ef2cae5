use serde::Serialize;

use crate::catalog::Catalog;

/// Kilograms of each resource assigned to each mixture by an optimal solve.
///
/// Quantities are indexed by catalog order: `quantities_kg[m][r]` is the
/// mass of the r-th resource that goes into the m-th mixture. Values are
/// never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    mixtures: Vec<String>,
    resources: Vec<String>,
    quantities_kg: Vec<Vec<f64>>,
    total_cost: f64,
}

impl Allocation {
    pub(crate) fn new(
        mixtures: Vec<String>,
        resources: Vec<String>,
        quantities_kg: Vec<Vec<f64>>,
        total_cost: f64,
    ) -> Self {
        debug_assert_eq!(quantities_kg.len(), mixtures.len());
        debug_assert!(quantities_kg.iter().all(|row| row.len() == resources.len()));
        Self {
            mixtures,
            resources,
            quantities_kg,
            total_cost,
        }
    }

    pub fn mixtures(&self) -> &[String] {
        &self.mixtures
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    fn mixture_index(&self, mixture: &str) -> Option<usize> {
        self.mixtures.iter().position(|m| m == mixture)
    }

    fn resource_index(&self, resource: &str) -> Option<usize> {
        self.resources.iter().position(|r| r == resource)
    }

    /// Kilograms of `resource` in `mixture`, `None` for unknown names.
    pub fn quantity(&self, mixture: &str, resource: &str) -> Option<f64> {
        let m = self.mixture_index(mixture)?;
        let r = self.resource_index(resource)?;
        Some(self.quantities_kg[m][r])
    }

    /// Total kilograms blended into `mixture`.
    pub fn mixture_total(&self, mixture: &str) -> Option<f64> {
        let m = self.mixture_index(mixture)?;
        Some(self.quantities_kg[m].iter().sum())
    }

    /// Total kilograms of `resource` drawn across all mixtures.
    pub fn resource_usage(&self, resource: &str) -> Option<f64> {
        let r = self.resource_index(resource)?;
        Some(self.quantities_kg.iter().map(|row| row[r]).sum())
    }

    /// Purchase cost of the resources blended into `mixture`.
    pub fn mixture_cost(&self, catalog: &Catalog, mixture: &str) -> Option<f64> {
        let m = self.mixture_index(mixture)?;
        let mut cost = 0.0;
        for (name, kg) in self.resources.iter().zip(&self.quantities_kg[m]) {
            cost += kg * catalog.resource(name)?.cost_per_kg;
        }
        Some(cost)
    }

    /// Objective value reported by the solver.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Every (mixture, resource, kg) triple in catalog order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.mixtures
            .iter()
            .zip(&self.quantities_kg)
            .flat_map(move |(mixture, row)| {
                self.resources
                    .iter()
                    .zip(row)
                    .map(move |(resource, &kg)| (mixture.as_str(), resource.as_str(), kg))
            })
    }

    /// Share of `nutrient` in `mixture`, as a percentage of the mixture's mass.
    pub fn nutrient_percentage(
        &self,
        catalog: &Catalog,
        mixture: &str,
        nutrient: &str,
    ) -> Option<f64> {
        let m = self.mixture_index(mixture)?;
        let total = self.mixture_total(mixture)?;
        if total <= 0.0 {
            return Some(0.0);
        }
        let mut nutrient_kg = 0.0;
        for (name, kg) in self.resources.iter().zip(&self.quantities_kg[m]) {
            nutrient_kg += kg * catalog.resource(name)?.composition_pct(nutrient) / 100.0;
        }
        Some(100.0 * nutrient_kg / total)
    }

    /// Share of `mixture` that is none of the catalog's nutrients (water, filler).
    pub fn residual_percentage(&self, catalog: &Catalog, mixture: &str) -> Option<f64> {
        let m = self.mixture_index(mixture)?;
        let total = self.mixture_total(mixture)?;
        if total <= 0.0 {
            return Some(0.0);
        }
        let mut residual_kg = 0.0;
        for (name, kg) in self.resources.iter().zip(&self.quantities_kg[m]) {
            residual_kg += kg * catalog.resource(name)?.residual_pct() / 100.0;
        }
        Some(100.0 * residual_kg / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> (Catalog, Allocation) {
        let catalog = Catalog::reference();
        let mixtures = catalog.mixtures.iter().map(|m| m.name.clone()).collect();
        let resources: Vec<String> = catalog.resources.iter().map(|r| r.name.clone()).collect();

        // LB: 200 kg Péptidos + 100 kg Agar, everything else empty
        let mut quantities = vec![vec![0.0; resources.len()]; catalog.mixtures.len()];
        quantities[0][1] = 200.0;
        quantities[0][4] = 100.0;
        quantities[3][1] = 50.0;
        let total = 250.0 * 510.0 + 100.0 * 826.0;

        let allocation = Allocation::new(mixtures, resources, quantities, total);
        (catalog, allocation)
    }

    #[test]
    fn test_lookups_by_name() {
        let (_, allocation) = sample();
        assert_eq!(allocation.quantity("LB", "Péptidos"), Some(200.0));
        assert_eq!(allocation.quantity("LB", "Fosfato"), Some(0.0));
        assert_eq!(allocation.quantity("LB", "Sal"), None);
        assert_eq!(allocation.quantity("BHI", "Agar"), None);

        assert_eq!(allocation.mixture_total("LB"), Some(300.0));
        assert_eq!(allocation.resource_usage("Péptidos"), Some(250.0));
    }

    #[test]
    fn test_costs() {
        let (catalog, allocation) = sample();
        assert_relative_eq!(
            allocation.mixture_cost(&catalog, "LB").unwrap(),
            200.0 * 510.0 + 100.0 * 826.0
        );
        assert_relative_eq!(allocation.mixture_cost(&catalog, "TSA").unwrap(), 0.0);
        assert_relative_eq!(allocation.total_cost(), 250.0 * 510.0 + 100.0 * 826.0);
    }

    #[test]
    fn test_percentages() {
        let (catalog, allocation) = sample();

        // 200 kg at 70% peptone over 300 kg
        assert_relative_eq!(
            allocation
                .nutrient_percentage(&catalog, "LB", "Peptona")
                .unwrap(),
            140.0 / 3.0,
            epsilon = 1e-9
        );
        // 100 kg at 84% agar over 300 kg
        assert_relative_eq!(
            allocation.nutrient_percentage(&catalog, "LB", "Agar").unwrap(),
            28.0,
            epsilon = 1e-9
        );
        // 200·30% + 100·11% residual
        assert_relative_eq!(
            allocation.residual_percentage(&catalog, "LB").unwrap(),
            71.0 / 3.0,
            epsilon = 1e-9
        );

        // An empty mixture reports zero instead of dividing by zero
        assert_eq!(
            allocation.nutrient_percentage(&catalog, "TSA", "Agar"),
            Some(0.0)
        );
    }

    #[test]
    fn test_iter_covers_every_pair() {
        let (_, allocation) = sample();
        let triples: Vec<_> = allocation.iter().collect();
        assert_eq!(triples.len(), 4 * 5);
        assert_eq!(triples[1], ("LB", "Péptidos", 200.0));
        assert_relative_eq!(triples.iter().map(|t| t.2).sum::<f64>(), 350.0);
    }
}
