//! Binary container codecs for Infinity Engine resources
//!
//! Every codec parses with `from_bytes`, bounds-checking each read, and
//! serializes with `to_bytes`, recomputing every section offset.

pub mod bam;
pub mod bmp;
pub mod chu;
pub mod dlg;
pub mod key;
pub mod mos;
pub mod mve;
pub mod plt;
pub mod pro;
pub mod tis;
pub mod two_da;
pub mod wed;
pub mod wmp;

pub use bam::{Bam, BamV1, BamV2, Cycle, FrameGeometry};
pub use bmp::Bmp;
pub use chu::Chu;
pub use dlg::Dlg;
pub use key::Key;
pub use mos::{Mos, MosV1, MosV2};
pub use mve::Mve;
pub use plt::Plt;
pub use pro::Pro;
pub use tis::Tis;
pub use two_da::TwoDa;
pub use wed::Wed;
pub use wmp::Wmp;
