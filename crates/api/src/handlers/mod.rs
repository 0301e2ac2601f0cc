pub mod farm_model;
