use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::geometry::Line;
use crate::store::ComponentStore;

/// Upper bound on generated points; sample counts come straight from scene files.
pub const MAX_GENERATED_POINTS: u32 = 4096;

/// Parametric source of line points, all in the entity's local XY plane
/// (the connector may leave it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all_fields = "camelCase")]
pub enum LineGenerator {
    Rectangle {
        width: f32,
        height: f32,
    },
    Ellipse {
        r1: f32,
        r2: f32,
        num_samples: u32,
    },
    Ngon {
        num_sides: u32,
        radius: f32,
    },
    /// S-shaped curve from `p1` to `p2`; `steepness` controls how sharp the bend is.
    Connector {
        p1: Vec3,
        p2: Vec3,
        steepness: f32,
        num_samples: u32,
    },
}

impl LineGenerator {
    /// Whether the generated outline is meant to be drawn as a loop.
    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::Connector { .. })
    }

    pub fn generate(&self) -> Vec<Vec3> {
        match *self {
            Self::Rectangle { width, height } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                vec![
                    Vec3::new(-hw, -hh, 0.0),
                    Vec3::new(hw, -hh, 0.0),
                    Vec3::new(hw, hh, 0.0),
                    Vec3::new(-hw, hh, 0.0),
                ]
            }
            Self::Ellipse { r1, r2, num_samples } => {
                let n = num_samples.clamp(3, MAX_GENERATED_POINTS);
                (0..n)
                    .map(|i| {
                        let a = TAU * i as f32 / n as f32;
                        Vec3::new(r1 * a.cos(), r2 * a.sin(), 0.0)
                    })
                    .collect()
            }
            Self::Ngon { num_sides, radius } => {
                let n = num_sides.clamp(3, MAX_GENERATED_POINTS);
                (0..n)
                    .map(|i| {
                        let a = FRAC_PI_2 + TAU * i as f32 / n as f32;
                        Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
                    })
                    .collect()
            }
            Self::Connector {
                p1,
                p2,
                steepness,
                num_samples,
            } => {
                let n = num_samples.clamp(2, MAX_GENERATED_POINTS);
                (0..n)
                    .map(|i| {
                        let t = i as f32 / (n - 1) as f32;
                        let s = smooth_step(t, steepness);
                        Vec3::new(
                            p1.x + (p2.x - p1.x) * t,
                            p1.y + (p2.y - p1.y) * s,
                            p1.z + (p2.z - p1.z) * t,
                        )
                    })
                    .collect()
            }
        }
    }
}

/// Logistic curve rescaled so that 0 maps to 0 and 1 maps to 1.
fn smooth_step(t: f32, steepness: f32) -> f32 {
    if steepness.abs() < 1e-4 {
        return t;
    }
    let sigmoid = |x: f32| 1.0 / (1.0 + (-steepness * (x - 0.5)).exp());
    let (lo, hi) = (sigmoid(0.0), sigmoid(1.0));
    (sigmoid(t) - lo) / (hi - lo)
}

/// Regenerate the `Line` of every entity that also has a `LineGenerator`.
///
/// Runs between frames; lines whose points are unchanged keep their revision.
/// Returns how many lines were rewritten.
pub fn apply_line_generators(store: &mut ComponentStore) -> usize {
    let pending: Vec<_> = store
        .query2::<LineGenerator, Line>()
        .filter_map(|(entity, generator, line)| {
            let points = generator.generate();
            (points.as_slice() != line.points()).then_some((entity, points))
        })
        .collect();

    let mut updated = 0;
    for (entity, points) in pending {
        if let Ok(line) = store.get_mut::<Line>(entity) {
            line.set_points(points);
            updated += 1;
        }
    }
    if updated > 0 {
        tracing::debug!(updated, "line generators applied");
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn rectangle_corners() {
        let pts = LineGenerator::Rectangle {
            width: 2.0,
            height: 4.0,
        }
        .generate();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(pts[2], Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn ngon_starts_at_top_and_has_min_three_sides() {
        let pts = LineGenerator::Ngon {
            num_sides: 1,
            radius: 2.0,
        }
        .generate();
        assert_eq!(pts.len(), 3);
        assert!(approx(pts[0], Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn sample_counts_are_capped() {
        let huge = 4_000_000_000;
        let generators = [
            LineGenerator::Ellipse {
                r1: 1.0,
                r2: 1.0,
                num_samples: huge,
            },
            LineGenerator::Ngon {
                num_sides: huge,
                radius: 1.0,
            },
            LineGenerator::Connector {
                p1: Vec3::ZERO,
                p2: Vec3::ONE,
                steepness: 6.0,
                num_samples: huge,
            },
        ];
        for generator in generators {
            assert_eq!(generator.generate().len(), MAX_GENERATED_POINTS as usize);
        }
    }

    #[test]
    fn ellipse_radii() {
        let pts = LineGenerator::Ellipse {
            r1: 3.0,
            r2: 1.0,
            num_samples: 4,
        }
        .generate();
        assert!(approx(pts[0], Vec3::new(3.0, 0.0, 0.0)));
        assert!(approx(pts[1], Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn connector_hits_both_endpoints() {
        let p1 = Vec3::new(-1.0, -1.0, 0.0);
        let p2 = Vec3::new(1.0, 1.0, 0.0);
        let pts = LineGenerator::Connector {
            p1,
            p2,
            steepness: 10.0,
            num_samples: 9,
        }
        .generate();
        assert_eq!(pts.len(), 9);
        assert!(approx(pts[0], p1));
        assert!(approx(pts[8], p2));
        // Midpoint of an S-curve sits at the centre.
        assert!(approx(pts[4], Vec3::ZERO));
    }

    #[test]
    fn apply_rewrites_only_changed_lines() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Outline");
        store.attach(e, Line::default()).unwrap();
        store
            .attach(
                e,
                LineGenerator::Rectangle {
                    width: 1.0,
                    height: 1.0,
                },
            )
            .unwrap();

        assert_eq!(apply_line_generators(&mut store), 1);
        let revision = store.get::<Line>(e).unwrap().revision();
        assert_eq!(store.get::<Line>(e).unwrap().points().len(), 4);

        assert_eq!(apply_line_generators(&mut store), 0);
        assert_eq!(store.get::<Line>(e).unwrap().revision(), revision);
    }

    #[test]
    fn serde_uses_type_tag() {
        let g = LineGenerator::Ellipse {
            r1: 1.0,
            r2: 2.0,
            num_samples: 16,
        };
        let yaml = serde_yaml::to_string(&g).unwrap();
        assert!(yaml.contains("Type: Ellipse"));
        assert!(yaml.contains("numSamples: 16"));
        let back: LineGenerator = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, g);
    }
}
