#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod fix;
pub mod nmea;
pub mod session;
pub mod transport;
pub mod worker;

pub use config::{Config, parse_config};
pub use error::{Error, Result, SentenceError};
pub use fix::Fix;
pub use session::{Session, startup};
pub use transport::{Transport, TransportKind};

pub mod prelude {
    pub use crate::{
        config::Config,
        error::{Error, Result},
        fix::Fix,
        session::{Session, startup},
        transport::TransportKind,
        worker::{StopOutcome, WorkerState},
    };
}
