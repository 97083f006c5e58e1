// SPDX-License-Identifier: PMPL-1.0-or-later
//! Privacybot - GDPR/NDPR Privacy Compliance Bot
//!
//! Privacybot visits a website through a page inspection session and runs a
//! set of heuristic compliance checks against it. Each check yields one
//! [`CheckResult`](model::CheckResult); the run is collected in a
//! [`Report`](model::Report) that renders as text, JSON or SARIF.
//!
//! ## Checks
//!
//! - **Cookie Banner** (ePrivacy 5(3)): banner with accept, reject and more-info controls
//! - **Privacy Policy** (Art. 13): policy link and required sections
//! - **Data Collection Forms** (Art. 7): consent and secure submission
//! - **Data Subject Rights** (Art. 15-22): rights information and request routes
//! - **Third-Party Tracking** (Art. 6): trackers and their disclosure
//! - **Secure Data Transfer** (Art. 32): HTTPS, HSTS, mixed content
//! - **Data Retention** (Art. 5(1)(e)): retention periods and legal basis
//! - **International Transfer** (Chapter V): transfers and safeguards
//! - **Data Breach** (Art. 33-34): breach procedures and DPO contact
//! - **Consent Management** (Art. 7): consent platform and cookie policy
//! - **Personal Data Exposure** (Art. 32): personal data in public text
//!
//! A failing or panicking check never aborts a run; it becomes an ERROR result.

pub mod checks;
pub mod config;
pub mod error;
pub mod inspect;
pub mod model;
pub mod report;
pub mod runner;

pub use checks::{default_registry, Check, PageContext};
pub use error::{PrivacyError, Result};
pub use model::{CheckResult, CheckStatus, Report, Severity, Solution};
pub use runner::CheckRegistry;
