pub mod parcel;
pub mod payment;
pub mod user;
