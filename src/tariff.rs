use bigdecimal::BigDecimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TariffError {
    #[error("a tariff needs at least one slab")]
    Empty,
    #[error("slab upper bounds must be strictly increasing")]
    UnorderedSlabs,
    #[error("exactly the last slab must be open-ended (`rest=RATE`)")]
    MisplacedOpenSlab,
}

/// One tariff slab: the units between the previous slab's upper bound and
/// `upper` are billed at `rate` rupees per unit. `upper` is cumulative
/// consumption in units; `None` marks the open-ended final slab.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    pub upper: Option<u64>,
    pub rate: BigDecimal,
}

impl FromStr for Slab {
    type Err = String;

    /// Parses `BOUND=RATE`, e.g. `300=12`, or `rest=25` for the final slab.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bound, rate) = s
            .split_once('=')
            .ok_or_else(|| format!("expected BOUND=RATE, got {s:?}"))?;
        let upper = match bound {
            "rest" => None,
            _ => Some(
                bound
                    .parse()
                    .map_err(|_| format!("invalid slab bound {bound:?}"))?,
            ),
        };
        let rate =
            BigDecimal::from_str(rate).map_err(|_| format!("invalid slab rate {rate:?}"))?;
        Ok(Slab { upper, rate })
    }
}

/// The amount owed for the portion of a consumption that falls in one slab.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabCharge {
    /// Units already billed by lower slabs.
    pub from: u64,
    /// The slab's cumulative upper bound; `None` for the final slab.
    pub to: Option<u64>,
    pub units: u64,
    pub rate: BigDecimal,
    pub amount: BigDecimal,
}

impl SlabCharge {
    /// Human-readable unit range of the slab, e.g. `0-100`, `101-300`, `500+`.
    pub fn range(&self) -> String {
        match self.to {
            Some(to) if self.from == 0 => format!("0-{to}"),
            Some(to) => format!("{}-{}", self.from + 1, to),
            None => format!("{}+", self.from),
        }
    }
}

/// A progressive slab tariff. Each slab's full capacity is billed at its own
/// rate before the next slab's rate applies, so a large consumption is never
/// billed entirely at the top marginal rate.
#[derive(Debug, Clone)]
pub struct Tariff {
    slabs: Vec<Slab>,
}

impl Tariff {
    /// The municipal water tariff published by the water board.
    pub fn municipal() -> Self {
        Self {
            slabs: vec![
                Slab {
                    upper: Some(100),
                    rate: BigDecimal::from(8),
                },
                Slab {
                    upper: Some(300),
                    rate: BigDecimal::from(12),
                },
                Slab {
                    upper: Some(500),
                    rate: BigDecimal::from(18),
                },
                Slab {
                    upper: None,
                    rate: BigDecimal::from(25),
                },
            ],
        }
    }

    pub fn new(slabs: Vec<Slab>) -> Result<Self, TariffError> {
        let (last, bounded) = slabs.split_last().ok_or(TariffError::Empty)?;
        if last.upper.is_some() || bounded.iter().any(|slab| slab.upper.is_none()) {
            return Err(TariffError::MisplacedOpenSlab);
        }
        let ascending = bounded
            .windows(2)
            .all(|pair| pair[0].upper < pair[1].upper);
        if !ascending {
            return Err(TariffError::UnorderedSlabs);
        }
        Ok(Self { slabs })
    }

    /// Splits `consumption` across the slabs it spans. Empty at zero
    /// consumption.
    pub fn charges(&self, consumption: u64) -> Vec<SlabCharge> {
        let mut charges = Vec::new();
        let mut billed = 0;
        for slab in &self.slabs {
            if consumption <= billed {
                break;
            }
            let billed_to = match slab.upper {
                Some(upper) => consumption.min(upper),
                None => consumption,
            };
            let units = billed_to - billed;
            charges.push(SlabCharge {
                from: billed,
                to: slab.upper,
                units,
                rate: slab.rate.clone(),
                amount: BigDecimal::from(units) * &slab.rate,
            });
            billed = billed_to;
        }
        charges
    }

    /// Total tax for `consumption` units, the sum of the per-slab charges.
    pub fn tax(&self, consumption: u64) -> BigDecimal {
        self.charges(consumption).into_iter().map(|c| c.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tax(consumption: u64) -> BigDecimal {
        Tariff::municipal().tax(consumption)
    }

    #[test]
    fn first_slab_is_flat_rate() {
        for c in 0..=100 {
            assert_eq!(tax(c), BigDecimal::from(c * 8));
        }
    }

    #[test]
    fn second_slab_keeps_first_slab_rate() {
        for c in 101..=300 {
            assert_eq!(tax(c), BigDecimal::from(800 + (c - 100) * 12));
        }
    }

    #[test]
    fn third_slab_keeps_lower_slab_rates() {
        for c in 301..=500 {
            assert_eq!(tax(c), BigDecimal::from(3200 + (c - 300) * 18));
        }
    }

    #[test]
    fn final_slab_keeps_lower_slab_rates() {
        for c in [501, 650, 1000, 10_000] {
            assert_eq!(tax(c), BigDecimal::from(6800 + (c - 500) * 25));
        }
    }

    #[test]
    fn no_discontinuity_at_slab_edges() {
        assert_eq!(tax(100), BigDecimal::from(800));
        assert_eq!(tax(300), BigDecimal::from(3200));
        assert_eq!(tax(500), BigDecimal::from(6800));
    }

    #[test]
    fn published_rate_card_examples() {
        assert_eq!(tax(45), BigDecimal::from(360));
        assert_eq!(tax(250), BigDecimal::from(2600));
        assert_eq!(tax(450), BigDecimal::from(5900));
        assert_eq!(tax(650), BigDecimal::from(10_550));
    }

    #[test]
    fn breakdown_spans_every_slab_reached() {
        let charges = Tariff::municipal().charges(650);
        assert_eq!(
            charges.iter().map(SlabCharge::range).collect::<Vec<_>>(),
            ["0-100", "101-300", "301-500", "500+"]
        );
        assert_eq!(
            charges.iter().map(|c| c.units).collect::<Vec<_>>(),
            [100, 200, 200, 150]
        );
        assert_eq!(
            charges.iter().map(|c| c.amount.clone()).sum::<BigDecimal>(),
            tax(650)
        );
    }

    #[test]
    fn breakdown_stops_at_partial_slab() {
        let charges = Tariff::municipal().charges(250);
        assert_eq!(charges.len(), 2);
        assert_eq!(charges[1].units, 150);
        assert_eq!(charges[1].amount, BigDecimal::from(1800));
    }

    #[test]
    fn zero_consumption_bills_nothing() {
        assert_eq!(tax(0), BigDecimal::from(0));
        assert!(Tariff::municipal().charges(0).is_empty());
    }

    #[test]
    fn slab_arg_parsing() {
        assert_eq!(
            "300=12".parse(),
            Ok(Slab {
                upper: Some(300),
                rate: BigDecimal::from(12),
            })
        );
        assert_eq!(
            "rest=25.50".parse(),
            Ok(Slab {
                upper: None,
                rate: BigDecimal::from_str("25.50").unwrap(),
            })
        );
        assert!("300".parse::<Slab>().is_err());
        assert!("ten=8".parse::<Slab>().is_err());
        assert!("100=cheap".parse::<Slab>().is_err());
    }

    #[test]
    fn custom_tariff_validation() {
        let slab = |s: &str| s.parse::<Slab>().unwrap();
        assert!(Tariff::new(vec![slab("50=4"), slab("rest=9")]).is_ok());
        assert!(matches!(Tariff::new(vec![]), Err(TariffError::Empty)));
        assert!(matches!(
            Tariff::new(vec![slab("50=4"), slab("50=9"), slab("rest=9")]),
            Err(TariffError::UnorderedSlabs)
        ));
        assert!(matches!(
            Tariff::new(vec![slab("rest=4"), slab("rest=9")]),
            Err(TariffError::MisplacedOpenSlab)
        ));
        assert!(matches!(
            Tariff::new(vec![slab("50=4"), slab("100=9")]),
            Err(TariffError::MisplacedOpenSlab)
        ));
    }

    #[test]
    fn custom_tariff_is_progressive() {
        let tariff = Tariff::new(vec![
            "10=1".parse().unwrap(),
            "20=2".parse().unwrap(),
            "rest=5".parse().unwrap(),
        ])
        .unwrap();
        assert_eq!(tariff.tax(25), BigDecimal::from(10 + 20 + 25));
    }
}
