use std::collections::HashSet;

use super::error::TrackerError;

/// Namespace for the dedup state: live positions and predicted landings are
/// tracked separately.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
)]
pub enum RingPrefix {
    #[strum(serialize = "")]
    Live,
    #[strum(serialize = "prediction")]
    Prediction,
}

/// One alert threshold. Thresholds are in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRing {
    pub id: usize,
    pub name: String,
    pub range_m: f64,
    pub max_altitude_m: f64,
    pub only_descending: bool,
}

/// A ring matched by a check, together with the prefix it was checked under.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredRing {
    pub ring: RangeRing,
    pub prefix: RingPrefix,
}

impl TriggeredRing {
    pub fn label(&self) -> String {
        match self.prefix {
            RingPrefix::Live => format!("range_ring_{}", self.ring.id),
            RingPrefix::Prediction => format!("{}_range_ring_{}", self.prefix, self.ring.id),
        }
    }
}

/// Rings that already fired for one sonde, keyed by `(prefix, ring id)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifiedRings(HashSet<(RingPrefix, usize)>);

impl NotifiedRings {
    pub fn contains(&self, prefix: RingPrefix, id: usize) -> bool {
        self.0.contains(&(prefix, id))
    }

    pub fn insert(&mut self, prefix: RingPrefix, id: usize) {
        self.0.insert((prefix, id));
    }
}

/// The configured rings, ascending by range. Ids follow that order.
#[derive(Debug, Clone)]
pub struct RingRegistry {
    rings: Vec<RangeRing>,
}

impl RingRegistry {
    /// Sort `rings` by range and assign ids `0..n` in that order. Incoming
    /// ids are ignored.
    pub fn new(mut rings: Vec<RangeRing>) -> Result<Self, TrackerError> {
        if rings.is_empty() {
            return Err(TrackerError::NoRangeRings);
        }
        if let Some(ring) = rings.iter().find(|r| {
            !r.range_m.is_finite()
                || !r.max_altitude_m.is_finite()
                || r.range_m < 0.0
                || r.max_altitude_m < 0.0
        }) {
            return Err(TrackerError::InvalidThreshold(ring.name.clone()));
        }

        rings.sort_by(|a, b| a.range_m.total_cmp(&b.range_m));
        for (id, ring) in rings.iter_mut().enumerate() {
            ring.id = id;
        }

        if rings
            .windows(2)
            .any(|pair| pair[1].max_altitude_m < pair[0].max_altitude_m)
        {
            log::warn!(
                "Range ring altitudes do not grow with radius; wider rings may stay silent after a narrower one fired"
            );
        }

        Ok(Self { rings })
    }

    pub fn rings(&self) -> &[RangeRing] {
        &self.rings
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Return the narrowest unfired ring that the given position satisfies.
    ///
    /// Distance and altitude are truncated to whole meters before comparing.
    pub fn check_rings(
        &self,
        notified: &NotifiedRings,
        distance_m: f64,
        altitude_m: f64,
        descending: bool,
        prefix: RingPrefix,
    ) -> Option<TriggeredRing> {
        let distance = distance_m.trunc();
        let altitude = altitude_m.trunc();

        self.rings
            .iter()
            .filter(|ring| !notified.contains(prefix, ring.id))
            .filter(|ring| descending || !ring.only_descending)
            .find(|ring| distance <= ring.range_m && altitude <= ring.max_altitude_m)
            .map(|ring| TriggeredRing {
                ring: ring.clone(),
                prefix,
            })
    }

    /// Mark `ring` and every wider ring as notified under `prefix`.
    pub fn mark_notified(&self, notified: &mut NotifiedRings, ring: &RangeRing, prefix: RingPrefix) {
        for wider in self.rings.iter().filter(|r| r.id >= ring.id) {
            notified.insert(prefix, wider.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(name: &str, range_m: f64, max_altitude_m: f64, only_descending: bool) -> RangeRing {
        RangeRing {
            id: 0,
            name: name.to_string(),
            range_m,
            max_altitude_m,
            only_descending,
        }
    }

    fn registry() -> RingRegistry {
        RingRegistry::new(vec![
            ring("far", 20_000.0, 3_000.0, false),
            ring("near", 5_000.0, 1_000.0, false),
        ])
        .unwrap()
    }

    #[test]
    fn sorts_by_range_and_assigns_ids() {
        let registry = registry();
        let names: Vec<_> = registry.rings().iter().map(|r| r.name.as_str()).collect();
        let ids: Vec<_> = registry.rings().iter().map(|r| r.id).collect();
        assert_eq!(names, ["near", "far"]);
        assert_eq!(ids, [0, 1]);
    }

    #[test]
    fn rejects_empty_registry() {
        assert!(matches!(
            RingRegistry::new(Vec::new()),
            Err(TrackerError::NoRangeRings)
        ));
    }

    #[test]
    fn rejects_negative_threshold() {
        let result = RingRegistry::new(vec![ring("bad", -1.0, 100.0, false)]);
        assert!(matches!(result, Err(TrackerError::InvalidThreshold(name)) if name == "bad"));
    }

    #[test]
    fn narrowest_satisfied_ring_wins() {
        let registry = registry();
        let notified = NotifiedRings::default();
        let hit = registry
            .check_rings(&notified, 4_000.0, 500.0, false, RingPrefix::Live)
            .unwrap();
        assert_eq!(hit.ring.name, "near");
        assert_eq!(hit.label(), "range_ring_0");
    }

    #[test]
    fn marking_suppresses_wider_rings() {
        let registry = registry();
        let mut notified = NotifiedRings::default();
        let hit = registry
            .check_rings(&notified, 4_000.0, 500.0, false, RingPrefix::Live)
            .unwrap();
        registry.mark_notified(&mut notified, &hit.ring, RingPrefix::Live);

        assert!(notified.contains(RingPrefix::Live, 0));
        assert!(notified.contains(RingPrefix::Live, 1));
        assert!(registry
            .check_rings(&notified, 4_000.0, 500.0, false, RingPrefix::Live)
            .is_none());
        assert!(registry
            .check_rings(&notified, 15_000.0, 2_000.0, false, RingPrefix::Live)
            .is_none());
    }

    #[test]
    fn marking_wider_ring_keeps_narrower_open() {
        let registry = registry();
        let mut notified = NotifiedRings::default();
        let hit = registry
            .check_rings(&notified, 15_000.0, 2_000.0, false, RingPrefix::Live)
            .unwrap();
        assert_eq!(hit.ring.id, 1);
        registry.mark_notified(&mut notified, &hit.ring, RingPrefix::Live);

        let closer = registry
            .check_rings(&notified, 3_000.0, 200.0, false, RingPrefix::Live)
            .unwrap();
        assert_eq!(closer.ring.id, 0);
    }

    #[test]
    fn prefixes_are_isolated() {
        let registry = registry();
        let mut notified = NotifiedRings::default();
        let near = registry.rings()[0].clone();
        registry.mark_notified(&mut notified, &near, RingPrefix::Live);

        let predicted = registry
            .check_rings(&notified, 4_000.0, 0.0, false, RingPrefix::Prediction)
            .unwrap();
        assert_eq!(predicted.ring.id, 0);
        assert_eq!(predicted.label(), "prediction_range_ring_0");

        let mut notified = NotifiedRings::default();
        registry.mark_notified(&mut notified, &near, RingPrefix::Prediction);
        assert!(registry
            .check_rings(&notified, 4_000.0, 0.0, false, RingPrefix::Live)
            .is_some());
    }

    #[test]
    fn descending_only_ring_needs_descent() {
        let registry = RingRegistry::new(vec![
            ring("landing", 5_000.0, 1_000.0, true),
            ring("area", 50_000.0, 40_000.0, false),
        ])
        .unwrap();
        let notified = NotifiedRings::default();

        let rising = registry
            .check_rings(&notified, 4_000.0, 500.0, false, RingPrefix::Live)
            .unwrap();
        assert_eq!(rising.ring.name, "area");

        let falling = registry
            .check_rings(&notified, 4_000.0, 500.0, true, RingPrefix::Live)
            .unwrap();
        assert_eq!(falling.ring.name, "landing");
    }

    #[test]
    fn thresholds_compare_truncated_values() {
        let registry = registry();
        let notified = NotifiedRings::default();
        let hit = registry
            .check_rings(&notified, 5_000.9, 1_000.7, false, RingPrefix::Live)
            .unwrap();
        assert_eq!(hit.ring.id, 0);
        assert_eq!(
            registry
                .check_rings(&notified, 5_001.0, 1_000.0, false, RingPrefix::Live)
                .map(|hit| hit.ring.id),
            Some(1)
        );
    }

    #[test]
    fn no_match_outside_all_rings() {
        let registry = registry();
        assert!(registry
            .check_rings(
                &NotifiedRings::default(),
                25_000.0,
                500.0,
                true,
                RingPrefix::Live
            )
            .is_none());
    }
}
