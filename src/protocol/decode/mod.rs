//! Value codecs for the XSQLDA data buffer.
//!
//! | Column type | Module |
//! |-------------|--------|
//! | INT128      | `int128` |
//! | NUMERIC / DECIMAL | `decimal` |
//! | DATE / TIME / TIMESTAMP | `date` |
//!
//! Fixed-width integers, floats and booleans are read straight from the
//! buffer in native byte order and don't need dedicated codecs.

pub mod date;
pub mod decimal;
pub mod int128;

pub use date::{
    decode_isc_date, decode_isc_time, decode_isc_timestamp, encode_isc_date, encode_isc_time,
    encode_isc_timestamp,
};
pub use decimal::{from_scaled_integer, rescale, scale_of};
pub use int128::{decompose, recompose, Int128};
