//! Word entity: one token occurrence at a corpus position

use crate::morph::PartOfSpeech;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "words")]
pub struct Model {
    /// Corpus position; consecutive ids are consecutive words
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// Lower-cased surface form
    pub token: String,

    pub lemma: String,

    /// Part-of-speech label, absent for words the analyzer did not know
    pub pos: Option<String>,

    pub passage_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::passage::Entity",
        from = "Column::PassageId",
        to = "super::passage::Column::Id",
        on_delete = "Cascade"
    )]
    Passage,
}

impl Related<super::passage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Passage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Stored label parsed back into the closed tag set
    pub fn part_of_speech(&self) -> Option<PartOfSpeech> {
        self.pos.as_deref().and_then(PartOfSpeech::from_label)
    }
}

impl From<Model> for crate::store::Word {
    fn from(model: Model) -> Self {
        Self {
            pos: model.part_of_speech(),
            id: model.id,
            token: model.token,
            lemma: model.lemma,
            context_id: model.passage_id,
        }
    }
}
