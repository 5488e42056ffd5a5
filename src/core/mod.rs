pub mod alignment;
pub mod batch;
pub mod cigar;
pub mod io;
pub mod read;
pub mod reference;
pub mod value;
