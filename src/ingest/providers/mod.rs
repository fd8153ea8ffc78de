pub mod freelance_ru;
pub mod static_listing;
