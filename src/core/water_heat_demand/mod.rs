pub mod load_profile;
