//! 도메인 모델.

mod principal;

pub use principal::{NewPrincipal, Principal, PrincipalId};
