// Domain layer - Editor state and business rules

pub mod cut_list;
pub mod errors;
pub mod model;
pub mod selection;
