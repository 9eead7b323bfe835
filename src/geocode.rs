use polars::prelude::*;
use rand::distributions::{Distribution, Open01, WeightedIndex};
use rand::Rng;
use tracing::debug;

use crate::config::ZoneSpec;
use crate::error::{GeocodeFault, Result};
use crate::schema::derived;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Where the `Real_*` coordinate columns come from.
///
/// No real geolocation source exists yet; the real columns mirror the simulated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Simulated,
}

/// Zone centres plus a weighted sampler over them.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: Vec<ZoneSpec>,
    sampler: WeightedIndex<f64>,
}

impl ZoneTable {
    /// Weights must be finite, non-negative and sum to 1.0.
    pub fn new(zones: &[ZoneSpec]) -> std::result::Result<Self, GeocodeFault> {
        if zones.is_empty() {
            return Err(GeocodeFault::InvalidWeights("no zones configured".into()));
        }
        if let Some(bad) = zones
            .iter()
            .find(|z| !z.weight.is_finite() || z.weight < 0.0)
        {
            return Err(GeocodeFault::InvalidWeights(format!(
                "zone '{}' has weight {}",
                bad.name, bad.weight
            )));
        }
        let total: f64 = zones.iter().map(|z| z.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(GeocodeFault::InvalidWeights(format!(
                "weights sum to {total}, expected 1.0"
            )));
        }

        let sampler = WeightedIndex::new(zones.iter().map(|z| z.weight))?;
        Ok(Self {
            zones: zones.to_vec(),
            sampler,
        })
    }

    pub fn zones(&self) -> &[ZoneSpec] {
        &self.zones
    }

    pub fn center(&self, name: &str) -> Option<(f64, f64)> {
        self.zones
            .iter()
            .find(|z| z.name == name)
            .map(|z| (z.lat, z.lon))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &ZoneSpec {
        &self.zones[self.sampler.sample(rng)]
    }
}

/// Uniform offset strictly inside (-half_width, +half_width).
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    let u: f64 = Open01.sample(rng);
    half_width * (2.0 * u - 1.0)
}

/// Assign a `Zone` and jittered coordinates to every row.
///
/// Draw order per row is zone, latitude offset, longitude offset, so the same
/// seed and row count always reproduce the same columns. `Location_*` and
/// `Real_*` are copies of `Sim_*`.
pub fn assign_zones<R: Rng + ?Sized>(
    df: DataFrame,
    table: &ZoneTable,
    jitter_deg: f64,
    rng: &mut R,
) -> Result<DataFrame> {
    let df = attach_coordinates(df, table, jitter_deg, rng)?;
    Ok(df)
}

fn attach_coordinates<R: Rng + ?Sized>(
    mut df: DataFrame,
    table: &ZoneTable,
    jitter_deg: f64,
    rng: &mut R,
) -> std::result::Result<DataFrame, GeocodeFault> {
    let n = df.height();
    let mut zones: Vec<&str> = Vec::with_capacity(n);
    let mut lats: Vec<f64> = Vec::with_capacity(n);
    let mut lons: Vec<f64> = Vec::with_capacity(n);

    for _ in 0..n {
        let zone = table.sample(rng);
        zones.push(zone.name.as_str());
        lats.push(zone.lat + jitter(rng, jitter_deg));
        lons.push(zone.lon + jitter(rng, jitter_deg));
    }

    df.with_column(Series::new(derived::ZONE.into(), zones))?;
    for (name, values) in [
        (derived::SIM_LAT, &lats),
        (derived::SIM_LON, &lons),
        (derived::LOCATION_LAT, &lats),
        (derived::LOCATION_LONG, &lons),
        (derived::REAL_LAT, &lats),
        (derived::REAL_LON, &lons),
    ] {
        df.with_column(Series::new(name.into(), values.as_slice()))?;
    }

    debug!(rows = n, zones = table.zones().len(), "synthetic geocoding done");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_zones, DEFAULT_JITTER_DEG};
    use crate::error::PrepError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn default_table_builds() {
        let table = ZoneTable::new(&default_zones()).unwrap();
        assert_eq!(table.zones().len(), 6);
        assert_eq!(table.center("Sa'i"), Some((21.4215, 39.8280)));
        assert_eq!(table.center("Jeddah"), None);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut zones = default_zones();
        zones[0].weight = 0.5;
        let err = ZoneTable::new(&zones).unwrap_err();
        assert!(matches!(err, GeocodeFault::InvalidWeights(_)));
    }

    #[test]
    fn rejects_negative_weight() {
        let zones = vec![
            ZoneSpec::new("A", 0.0, 0.0, 1.5),
            ZoneSpec::new("B", 0.0, 0.0, -0.5),
        ];
        assert!(matches!(
            ZoneTable::new(&zones),
            Err(GeocodeFault::InvalidWeights(_))
        ));
    }

    #[test]
    fn fault_converts_to_classified_error() {
        let err: PrepError = ZoneTable::new(&[]).unwrap_err().into();
        assert!(matches!(err, PrepError::GeocodeSimulation(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn sampled_frequencies_track_weights() {
        let table = ZoneTable::new(&default_zones()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 100_000;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..n {
            *counts.entry(table.sample(&mut rng).name.as_str()).or_default() += 1;
        }

        for zone in default_zones() {
            let observed = counts.get(zone.name.as_str()).copied().unwrap_or(0) as f64 / n as f64;
            assert!(
                (observed - zone.weight).abs() < 0.01,
                "{}: observed {observed}, expected {}",
                zone.name,
                zone.weight
            );
        }
    }

    #[test]
    fn jitter_stays_inside_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50_000 {
            let offset = jitter(&mut rng, DEFAULT_JITTER_DEG);
            assert!(offset.abs() < DEFAULT_JITTER_DEG);
        }
    }

    #[test]
    fn assigns_all_coordinate_columns() {
        let table = ZoneTable::new(&default_zones()).unwrap();
        let df = polars::df!("Id" => [1i32, 2, 3, 4, 5]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let out = assign_zones(df, &table, DEFAULT_JITTER_DEG, &mut rng).unwrap();

        let zones: Vec<&str> = out
            .column("Zone")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let coord = |name: &str| -> Vec<f64> {
            out.column(name)
                .unwrap()
                .f64()
                .unwrap()
                .into_no_null_iter()
                .collect()
        };
        let (lats, lons) = (coord("Sim_Lat"), coord("Sim_Lon"));
        assert_eq!(zones.len(), 5);

        for ((zone, lat), lon) in zones.iter().zip(&lats).zip(&lons) {
            let (clat, clon) = table.center(zone).unwrap();
            assert!((lat - clat).abs() < DEFAULT_JITTER_DEG);
            assert!((lon - clon).abs() < DEFAULT_JITTER_DEG);
        }

        assert_eq!(coord("Location_Lat"), lats);
        assert_eq!(coord("Location_Long"), lons);
        assert_eq!(coord("Real_Lat"), lats);
        assert_eq!(coord("Real_Lon"), lons);
    }

    #[test]
    fn same_seed_same_assignment() {
        let table = ZoneTable::new(&default_zones()).unwrap();
        let run = || {
            let df = polars::df!("Id" => [1i32, 2, 3, 4, 5, 6, 7, 8]).unwrap();
            let mut rng = StdRng::seed_from_u64(42);
            assign_zones(df, &table, DEFAULT_JITTER_DEG, &mut rng).unwrap()
        };
        assert!(run().equals(&run()));
    }
}
