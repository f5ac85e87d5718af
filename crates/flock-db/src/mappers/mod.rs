//! Entity <-> model mappers

mod broadcast;
mod delivery;
mod member;
mod reaction;
