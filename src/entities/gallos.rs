use sea_orm::entity::prelude::*;

/// A registered rooster with genealogy, leg-band metadata and photos.
///
/// `id` and `user_id` are immutable after creation; every query against this
/// table is filtered by the owning user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "gallos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: i32,

    pub nombre: String,

    pub padre: Option<String>,
    pub madre: Option<String>,
    pub abuelo: Option<String>,
    pub abuela: Option<String>,

    pub placa_gallo: Option<String>,
    pub placa_padre: Option<String>,
    pub placa_madre: Option<String>,
    pub placa_abuelo: Option<String>,
    pub placa_abuela: Option<String>,

    pub fecha_marcado: Option<String>,

    pub color_general: Option<String>,
    pub color_patas: Option<String>,
    pub tipo_cresta: Option<String>,

    /// `brida` or `tairra`
    pub tipo_brida: Option<String>,
    pub numero_brida: Option<String>,
    pub color_brida: Option<String>,
    pub ubicacion_brida: Option<String>,

    pub descripcion: Option<String>,

    pub foto_gallo: Option<String>,
    pub foto_padre: Option<String>,
    pub foto_madre: Option<String>,
    pub foto_abuelo: Option<String>,
    pub foto_abuela: Option<String>,

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
