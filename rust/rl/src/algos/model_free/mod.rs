pub mod gradient_free;

use gridworld::{Cell, Continous, Transition};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

pub trait Weighted<S> {
    fn s(&self) -> S;

    fn p(&self) -> Continous;
}

impl<'a> Weighted<&'a Cell> for Transition<'a> {
    fn s(&self) -> &'a Cell {
        self.landing
    }

    fn p(&self) -> Continous {
        self.probability
    }
}

/// Draws one item with probability proportional to its weight. `None` when
/// no item has positive weight.
pub fn pick_next<T, S, R>(rng: &mut R, ts: &[T]) -> Option<S>
where
    T: Weighted<S>,
    R: Rng,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng)).map(|item| item.s())
}

#[cfg(test)]
mod tests {
    use super::{pick_next, Weighted};
    use float_eq::*;
    use rand::prelude::*;

    #[test]
    fn draws_follow_weights() {
        let items = &mut vec![
            Outcome {
                s: 0,
                p: 0.2,
                hits: 0,
            },
            Outcome {
                s: 1,
                p: 0.8,
                hits: 0,
            },
        ];

        let rng = &mut StdRng::seed_from_u64(2718);
        let n = 10000;
        for _ in 0..n {
            let i: usize = pick_next(rng, &items[..]).unwrap();
            items[i].hits += 1;
        }

        assert_float_eq!(items[0].hits as f64 / n as f64, 0.2, abs <= 2e-2);
        assert_float_eq!(items[1].hits as f64 / n as f64, 0.8, abs <= 2e-2);
    }

    #[test]
    fn all_zero_weights_draw_nothing() {
        let items = vec![Outcome {
            s: 0,
            p: 0.,
            hits: 0,
        }];
        let rng = &mut StdRng::seed_from_u64(1);
        assert_eq!(pick_next::<_, usize, _>(rng, &items), None);
    }

    struct Outcome {
        pub s: usize,
        pub p: f64,
        pub hits: u32,
    }

    impl Weighted<usize> for Outcome {
        fn p(&self) -> f64 {
            self.p
        }

        fn s(&self) -> usize {
            self.s
        }
    }
}
