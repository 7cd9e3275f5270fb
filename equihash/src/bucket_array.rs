//! Storage for the solver's collision tables
//!
//! Each round of the search reads one [`table::BucketTable`] and writes
//! another. A table is a flat array of `num_buckets * depth` entry slots
//! plus one atomic occupancy counter per bucket. Writers reserve a slot by
//! clamp-incrementing the counter, so concurrent inserts never share a slot
//! and never grow a bucket past its depth. Inserts that find the bucket
//! full are dropped and counted as overflow.
//!
//! Slots hold fixed size [`entry::Entry`] values: a partial XOR and a
//! packed link to where it came from. The links of each finished table are
//! copied into a [`layer::LinkLayer`] before the table is reused, which is
//! all that's needed to rebuild the index list of a solution at the end.

pub(crate) mod entry;
pub(crate) mod layer;
pub(crate) mod table;
