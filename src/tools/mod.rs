pub mod bitstream;
pub mod serialize;
pub mod shifted;
