//! Term shapes: how a number is laid out in tiles

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

use crate::solver::evaluator::MAX_NUMBER_DIGITS;
use crate::token::{ConcreteToken, MAX_TILE_NUMBER};

/// Smallest number on a heavy tile
const MIN_HEAVY: i64 = 10;

/// Layout of one term of the solution equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TermShape {
    /// A single tile 10-20
    Heavy,
    /// A run of light tiles read as a decimal number
    Light(u8),
}

impl TermShape {
    /// Inclusive value range of the shape
    fn range(self) -> (i64, i64) {
        match self {
            TermShape::Heavy => (MIN_HEAVY, MAX_TILE_NUMBER as i64),
            TermShape::Light(1) => (0, 9),
            TermShape::Light(d) => (10i64.pow(d as u32 - 1), 10i64.pow(d as u32) - 1),
        }
    }

    #[inline]
    pub(super) fn fits(self, value: i64) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&value)
    }

    /// Random value of this shape; every non-leading digit is zero with
    /// probability `zero_chance`
    pub(super) fn sample<R: Rng + ?Sized>(self, rng: &mut R, zero_chance: f64) -> i64 {
        match self {
            TermShape::Heavy => rng.gen_range(MIN_HEAVY..=MAX_TILE_NUMBER as i64),
            TermShape::Light(1) if rng.gen_bool(zero_chance) => 0,
            TermShape::Light(digits) => {
                let mut value: i64 = rng.gen_range(1..=9);
                for _ in 1..digits {
                    let digit = if rng.gen_bool(zero_chance) {
                        0
                    } else {
                        rng.gen_range(1..=9)
                    };
                    value = value * 10 + digit;
                }
                value
            }
        }
    }

    /// Random value of this shape dividing `dividend` exactly, free of zero digits
    pub(super) fn sample_divisor<R: Rng + ?Sized>(self, rng: &mut R, dividend: i64) -> Option<i64> {
        let (lo, hi) = self.range();
        let candidates: Vec<i64> = (lo.max(1)..=hi)
            .filter(|&v| dividend % v == 0 && !has_zero_digit(v))
            .collect();
        candidates.choose(rng).copied()
    }

    /// Tiles spelling `value` in this shape
    pub(super) fn tiles(self, value: i64) -> SmallVec<[ConcreteToken; 3]> {
        match self {
            TermShape::Heavy => SmallVec::from_elem(ConcreteToken::Number(value as u8), 1),
            TermShape::Light(_) => value
                .to_string()
                .bytes()
                .map(|b| ConcreteToken::Number(b - b'0'))
                .collect(),
        }
    }
}

#[inline]
pub(super) fn has_zero_digit(value: i64) -> bool {
    value.to_string().contains('0')
}

/// Digit counts for `terms` light terms sharing `tiles` light tiles
///
/// `None` when the tiles cannot be split into runs of 1-3.
pub(super) fn split_light_tiles<R: Rng + ?Sized>(
    rng: &mut R,
    terms: usize,
    tiles: usize,
) -> Option<SmallVec<[u8; 8]>> {
    let max_digits = MAX_NUMBER_DIGITS as usize;
    if tiles < terms || tiles > terms * max_digits {
        return None;
    }
    let mut lengths: SmallVec<[u8; 8]> = SmallVec::from_elem(1, terms);
    for _ in terms..tiles {
        let open: SmallVec<[usize; 8]> = (0..terms)
            .filter(|&i| (lengths[i] as usize) < max_digits)
            .collect();
        let &i = open.choose(rng)?;
        lengths[i] += 1;
    }
    Some(lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fits() {
        assert!(TermShape::Heavy.fits(10));
        assert!(TermShape::Heavy.fits(20));
        assert!(!TermShape::Heavy.fits(9));
        assert!(TermShape::Light(1).fits(0));
        assert!(!TermShape::Light(2).fits(5));
        assert!(TermShape::Light(3).fits(999));
        assert!(!TermShape::Light(1).fits(-1));
    }

    #[test]
    fn test_sample_stays_in_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for shape in [TermShape::Heavy, TermShape::Light(1), TermShape::Light(2), TermShape::Light(3)] {
            for _ in 0..200 {
                let value = shape.sample(&mut rng, 0.3);
                assert!(shape.fits(value), "{:?} produced {}", shape, value);
            }
        }
    }

    #[test]
    fn test_no_zero_digits_when_chance_is_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert!(!has_zero_digit(TermShape::Light(3).sample(&mut rng, 0.0)));
        }
    }

    #[test]
    fn test_sample_divisor() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let d = TermShape::Light(1).sample_divisor(&mut rng, 12).unwrap();
            assert!([1, 2, 3, 4, 6].contains(&d));
        }
        // 10 and 20 contain zeros
        assert_eq!(TermShape::Heavy.sample_divisor(&mut rng, 40), None);
        assert_eq!(TermShape::Heavy.sample_divisor(&mut rng, 30), Some(15));
        assert!(TermShape::Light(2).sample_divisor(&mut rng, 0).is_some());
    }

    #[test]
    fn test_tiles() {
        assert_eq!(
            TermShape::Light(3).tiles(105).to_vec(),
            vec![
                ConcreteToken::Number(1),
                ConcreteToken::Number(0),
                ConcreteToken::Number(5)
            ]
        );
        assert_eq!(TermShape::Heavy.tiles(17).to_vec(), vec![ConcreteToken::Number(17)]);
    }

    #[test]
    fn test_split_light_tiles() {
        let mut rng = StdRng::seed_from_u64(5);
        let lengths = split_light_tiles(&mut rng, 3, 7).unwrap();
        assert_eq!(lengths.iter().map(|&d| d as usize).sum::<usize>(), 7);
        assert!(lengths.iter().all(|&d| (1..=3).contains(&d)));
        assert!(split_light_tiles(&mut rng, 2, 7).is_none());
        assert!(split_light_tiles(&mut rng, 3, 2).is_none());
        assert_eq!(split_light_tiles(&mut rng, 0, 0).unwrap().len(), 0);
    }
}
