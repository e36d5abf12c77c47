use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub case_id: String,
    pub business: String,
    pub filing_date: String,
    pub defendant: String,
    pub case_name: Option<String>,
    pub loaded: String,
    pub case_status: String,
    /// JSON array of strings.
    pub addresses: String,
    /// JSON object.
    pub other: String,
    pub query_id: String,
    pub user_status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::queries::Entity",
        from = "Column::QueryId",
        to = "super::queries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Queries,
}

impl Related<super::queries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Queries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
