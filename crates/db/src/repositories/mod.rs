mod farm_model_repo;
mod farm_repo;

pub use farm_model_repo::FarmModelRepo;
pub use farm_repo::FarmRepo;
