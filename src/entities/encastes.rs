use sea_orm::entity::prelude::*;

/// A breeding event tracked from the mating date through egg laying,
/// incubation and hatch. The `pendiente`/`incubando`/`completado` status is
/// derived, never stored (see `models::encaste::EstadoEncaste`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "encastes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: i32,

    pub fecha_encaste: String,
    pub hora_encaste: Option<String>,

    pub placa_padrote: String,
    pub placa_gallina: String,

    pub descripcion_brida: Option<String>,

    pub imagen_padrote: Option<String>,
    pub imagen_gallina: Option<String>,
    pub imagen_nido: Option<String>,

    pub fecha_primer_huevo: Option<String>,
    pub fecha_ultimo_huevo: Option<String>,

    /// Never negative
    pub total_huevos: i32,

    pub fecha_inicio_incubacion: Option<String>,

    /// Never negative
    pub cantidad_pollos_nacidos: i32,

    pub fecha_nacimiento: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
