use std::cmp::Ordering;

use crate::error::StrategyError;
use crate::model::{Orientation, PalletInstance, PlacementResult, orientations};

use super::{PlacementContext, PlacementStrategy};

/// Horizontal piece of the skyline: `[x, x + width)` is occupied up to `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkylineSegment {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl SkylineSegment {
    #[inline]
    fn end(&self) -> f64 {
        self.x + self.width
    }
}

/// Skyline packing along the container length.
///
/// For every orientation, each segment start is a candidate left edge; the
/// item rests on the highest segment under its span (including the clearance
/// to its right). The leftmost candidate wins, ties go to the lowest top
/// edge, so columns are filled before the next one is opened. The covered
/// span is then raised to the item's top edge plus clearance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Skyline;

impl PlacementStrategy for Skyline {
    fn name(&self) -> &'static str {
        "skyline"
    }

    fn run(
        &self,
        mut instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError> {
        let eps = ctx.epsilon();
        let mut skyline = vec![SkylineSegment {
            x: 0.0,
            y: 0.0,
            width: ctx.container.length,
        }];

        for instance in instances.iter_mut() {
            ctx.check_deadline()?;
            let Some(candidate) = find_position(instance, &skyline, ctx) else {
                continue;
            };
            instance.place_at(candidate.x, candidate.y, candidate.orientation);

            let end = (candidate.x + candidate.orientation.length + ctx.clearance)
                .min(ctx.container.length);
            let height = candidate.y + candidate.orientation.width + ctx.clearance;
            raise(&mut skyline, candidate.x, end, height, eps);
            check_coverage(&skyline, ctx.container.length, eps)?;
        }

        Ok(PlacementResult::new(instances))
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    x: f64,
    y: f64,
    orientation: Orientation,
}

impl Candidate {
    fn top(&self) -> f64 {
        self.y + self.orientation.width
    }
}

fn find_position(
    instance: &PalletInstance,
    skyline: &[SkylineSegment],
    ctx: &PlacementContext,
) -> Option<Candidate> {
    let eps = ctx.epsilon();
    let mut best: Option<Candidate> = None;

    for orientation in orientations(instance, instance.allow_rotation) {
        for segment in skyline {
            let x = segment.x;
            if x + orientation.length > ctx.container.length + eps {
                // Segments are ordered; later starts cannot fit either.
                break;
            }
            let run_end = (x + orientation.length + ctx.clearance).min(ctx.container.length);
            let y = resting_height(skyline, x, run_end);
            if y + orientation.width > ctx.container.width + eps {
                continue;
            }

            let candidate = Candidate { x, y, orientation };
            if best.is_none_or(|current| is_better(&candidate, &current, eps)) {
                best = Some(candidate);
            }
        }
    }

    best
}

/// Highest segment intersecting `[start, end)`.
fn resting_height(skyline: &[SkylineSegment], start: f64, end: f64) -> f64 {
    skyline
        .iter()
        .filter(|segment| segment.x < end && segment.end() > start)
        .map(|segment| segment.y)
        .fold(0.0, f64::max)
}

/// Leftmost first, then lowest top edge. Full ties keep the earlier candidate.
fn is_better(new: &Candidate, current: &Candidate, eps: f64) -> bool {
    match compare_with_epsilon(new.x, current.x, eps) {
        Ordering::Less => return true,
        Ordering::Greater => return false,
        Ordering::Equal => {}
    }
    compare_with_epsilon(new.top(), current.top(), eps) == Ordering::Less
}

fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Raises `[start, end)` to `height`, splitting segments at both boundaries.
///
/// Adjacent segments whose heights differ by at most `eps` are merged,
/// keeping the higher of the two.
fn raise(skyline: &mut Vec<SkylineSegment>, start: f64, end: f64, height: f64, eps: f64) {
    let raised = SkylineSegment {
        x: start,
        y: height,
        width: end - start,
    };
    let mut next: Vec<SkylineSegment> = Vec::with_capacity(skyline.len() + 2);
    let mut inserted = false;

    for segment in skyline.iter() {
        if segment.end() <= start || segment.x >= end {
            if !inserted && segment.x >= end {
                next.push(raised);
                inserted = true;
            }
            next.push(*segment);
            continue;
        }

        if segment.x < start {
            next.push(SkylineSegment {
                x: segment.x,
                y: segment.y,
                width: start - segment.x,
            });
        }
        if !inserted {
            next.push(raised);
            inserted = true;
        }
        if segment.end() > end {
            next.push(SkylineSegment {
                x: end,
                y: segment.y,
                width: segment.end() - end,
            });
        }
    }
    if !inserted {
        next.push(raised);
    }

    let mut merged: Vec<SkylineSegment> = Vec::with_capacity(next.len());
    for segment in next {
        if segment.width <= 0.0 {
            continue;
        }
        match merged.last_mut() {
            Some(last) if (last.y - segment.y).abs() <= eps => {
                last.y = last.y.max(segment.y);
                last.width = segment.end() - last.x;
            }
            _ => merged.push(segment),
        }
    }
    *skyline = merged;
}

/// Ensures the segments span `[0, length)` without gaps.
fn check_coverage(skyline: &[SkylineSegment], length: f64, eps: f64) -> Result<(), StrategyError> {
    let mut covered = 0.0;
    for segment in skyline {
        if (segment.x - covered).abs() > eps {
            return Err(StrategyError::SkylineGap { covered });
        }
        covered = segment.end();
    }
    if (covered - length).abs() > eps {
        return Err(StrategyError::SkylineGap { covered });
    }
    Ok(())
}
