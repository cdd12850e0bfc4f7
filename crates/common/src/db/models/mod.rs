//! SeaORM entity models
//!
//! Database entities for the Korpus corpus

mod passage;
mod word;

pub use passage::{
    Entity as PassageEntity,
    Model as PassageModel,
    ActiveModel as PassageActiveModel,
    Column as PassageColumn,
};

pub use word::{
    Entity as WordEntity,
    Model as WordModel,
    ActiveModel as WordActiveModel,
    Column as WordColumn,
};
