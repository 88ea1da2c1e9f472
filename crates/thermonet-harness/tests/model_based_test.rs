//! Model-based property tests.
//!
//! Random operation sequences are applied to a real [`Endpoint`] and to a
//! reference model that tracks only which tokens are live and which unit is
//! selected. The replies of both must agree after every operation.
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!       ModelSensor     Endpoint       Compare
//!       (reference)    (SimEnv)        replies
//! ```

use std::collections::BTreeSet;

use proptest::prelude::*;
use thermonet_core::{DegreeUnit, Endpoint, EndpointConfig, FixedSource, MAX_ACTIVE_TOKENS, Reply};
use thermonet_crypto::{KEY_SIZE, PasswordDigest, SecretKey};
use thermonet_harness::SimEnv;

const PASSWORD: &str = "secret";
const KELVIN: f64 = 300.0;

/// Index into the list of tokens issued so far. Out-of-range slots stand for
/// a token that was never issued.
type Slot = u8;

#[derive(Debug, Clone)]
enum Operation {
    Auth { correct: bool },
    Logout { slot: Slot },
    GetTemp { slot: Slot },
    SetUnit { slot: Slot, unit: DegreeUnit },
    Update { slot: Slot },
}

fn operation() -> impl Strategy<Value = Operation> {
    let unit = prop_oneof![
        Just(DegreeUnit::Kelvin),
        Just(DegreeUnit::Celsius),
        Just(DegreeUnit::Fahrenheit),
    ];

    prop_oneof![
        3 => any::<bool>().prop_map(|correct| Operation::Auth { correct }),
        2 => any::<Slot>().prop_map(|slot| Operation::Logout { slot: slot % 16 }),
        3 => any::<Slot>().prop_map(|slot| Operation::GetTemp { slot: slot % 16 }),
        1 => (any::<Slot>(), unit).prop_map(|(slot, unit)| Operation::SetUnit { slot: slot % 16, unit }),
        1 => any::<Slot>().prop_map(|slot| Operation::Update { slot: slot % 16 }),
    ]
}

/// Observable reply shape. Token values are random, so only their presence
/// is compared.
#[derive(Debug, Clone, PartialEq)]
enum Observed {
    Token,
    TooManyTokens,
    Temperature(String),
    BadToken,
}

fn observe(reply: &Reply) -> Observed {
    match reply {
        Reply::Token(_) => Observed::Token,
        Reply::TooManyTokens => Observed::TooManyTokens,
        Reply::Temperature(value) => Observed::Temperature(format!("{value:.6}")),
        Reply::BadToken => Observed::BadToken,
        other => panic!("operation produced unexpected reply {other:?}"),
    }
}

/// Reference model: a set of live slots and the selected unit.
#[derive(Debug, Default)]
struct ModelSensor {
    issued: usize,
    live: BTreeSet<usize>,
    unit: DegreeUnit,
}

impl ModelSensor {
    fn apply(&mut self, op: &Operation) -> Vec<Observed> {
        match *op {
            Operation::Auth { correct: false } => vec![],
            Operation::Auth { correct: true } => {
                if self.live.len() >= MAX_ACTIVE_TOKENS {
                    vec![Observed::TooManyTokens]
                } else {
                    self.live.insert(self.issued);
                    self.issued += 1;
                    vec![Observed::Token]
                }
            },
            Operation::Logout { slot } => {
                self.live.remove(&usize::from(slot));
                vec![]
            },
            Operation::GetTemp { slot } => {
                if self.live.contains(&usize::from(slot)) {
                    vec![Observed::Temperature(format!("{:.6}", self.unit.convert(KELVIN)))]
                } else {
                    vec![Observed::BadToken]
                }
            },
            Operation::SetUnit { slot, unit } => {
                if self.live.contains(&usize::from(slot)) {
                    self.unit = unit;
                    vec![]
                } else {
                    vec![Observed::BadToken]
                }
            },
            Operation::Update { slot } => {
                if self.live.contains(&usize::from(slot)) {
                    vec![]
                } else {
                    vec![Observed::BadToken]
                }
            },
        }
    }
}

/// Real endpoint plus the tokens it has handed out, indexed by slot.
struct RealSensor {
    endpoint: Endpoint<SimEnv>,
    issued: Vec<String>,
}

impl RealSensor {
    fn new(seed: u64) -> Self {
        let config = EndpointConfig::new(PASSWORD, SecretKey::from_bytes([0x42; KEY_SIZE]));
        let endpoint = Endpoint::new(SimEnv::with_seed(seed), config, FixedSource::new(KELVIN));
        Self { endpoint, issued: Vec::new() }
    }

    fn token(&self, slot: Slot) -> String {
        self.issued.get(usize::from(slot)).cloned().unwrap_or_else(|| "never-issued".to_string())
    }

    fn apply(&mut self, op: &Operation) -> Vec<Observed> {
        let plaintext = match *op {
            Operation::Auth { correct } => {
                let password = if correct { PASSWORD } else { "guess" };
                format!("AUTH {}", PasswordDigest::of_password(password).as_str())
            },
            Operation::Logout { slot } => format!("LOGOUT {}", self.token(slot)),
            Operation::GetTemp { slot } => format!("{};GET_TEMP", self.token(slot)),
            Operation::SetUnit { slot, unit } => format!("{};SET_DEG{}", self.token(slot), unit.symbol()),
            Operation::Update { slot } => format!("{};UPDATE_TEMP", self.token(slot)),
        };

        let replies = self.endpoint.dispatch(&plaintext);
        for reply in &replies {
            if let Reply::Token(token) = reply {
                self.issued.push(token.as_str().to_string());
            }
        }

        replies.iter().map(observe).collect()
    }
}

proptest! {
    #[test]
    fn endpoint_matches_model(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation(), 1..64),
    ) {
        let mut model = ModelSensor::default();
        let mut real = RealSensor::new(seed);

        for (i, op) in ops.iter().enumerate() {
            let expected = model.apply(op);
            let actual = real.apply(op);
            prop_assert_eq!(&actual, &expected, "operation {} ({:?}) diverged", i, op);

            prop_assert_eq!(real.endpoint.tokens().len(), model.live.len());
            prop_assert!(real.endpoint.tokens().len() <= MAX_ACTIVE_TOKENS);
            prop_assert_eq!(real.endpoint.degree_unit(), model.unit);
        }
    }
}
