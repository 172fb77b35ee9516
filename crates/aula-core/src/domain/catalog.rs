//! Built-in collections

use serde_json::json;

use super::schema::{AccessPolicy, CollectionSchema, FieldKind, FieldSpec, Ownership};

pub const USUARIOS: &str = "usuarios";
pub const TAREFAS: &str = "tarefas";
pub const PRODUTOS: &str = "produtos";
pub const PEDIDOS: &str = "pedidos";

pub const PRIORIDADES: &[&str] = &["baixa", "média", "alta"];
pub const PRIORIDADE_PADRAO: &str = "média";
pub const CATEGORIAS: &[&str] = &["Eletrônicos", "Livros", "Roupas", "Casa", "Esportes"];

pub const STATUS_PENDENTE: &str = "Pendente";
pub const STATUS_PROCESSADO: &str = "Processado";
pub const STATUS_PEDIDO: &[&str] = &[STATUS_PENDENTE, STATUS_PROCESSADO];

/// One order line.
pub static ITEM_PEDIDO: FieldKind = FieldKind::Object(&[
    ("produto_id", FieldKind::Integer { min: Some(1), max: None }),
    ("quantidade", FieldKind::Integer { min: Some(1), max: None }),
    ("preco_unitario", FieldKind::Number { min: Some(0.0), min_exclusive: true, max: None }),
]);

pub fn usuarios() -> CollectionSchema {
    CollectionSchema::new(
        USUARIOS,
        AccessPolicy { create_requires_session: false, ownership: Ownership::SelfRecord },
    )
    .with_field(FieldSpec::required("nome", FieldKind::full_name(2, 100)))
    .with_field(FieldSpec::required("email", FieldKind::Email).unique())
    .with_field(FieldSpec::optional("idade", FieldKind::integer(Some(0), Some(120))))
    .with_field(FieldSpec::optional("ativo", FieldKind::Bool).with_default(json!(true)))
}

pub fn tarefas() -> CollectionSchema {
    CollectionSchema::new(
        TAREFAS,
        AccessPolicy { create_requires_session: true, ownership: Ownership::Creator },
    )
    .with_field(FieldSpec::required("titulo", FieldKind::text(1, 200)))
    .with_field(FieldSpec::optional("descricao", FieldKind::text(0, 1000)))
    .with_field(
        FieldSpec::optional("prioridade", FieldKind::Choice(PRIORIDADES))
            .with_default(json!(PRIORIDADE_PADRAO)),
    )
    .with_field(
        FieldSpec::optional("concluida", FieldKind::Bool)
            .with_default(json!(false))
            .read_only(),
    )
    .with_field(FieldSpec::optional("concluida_em", FieldKind::Timestamp).read_only())
}

pub fn produtos() -> CollectionSchema {
    CollectionSchema::new(
        PRODUTOS,
        AccessPolicy { create_requires_session: true, ownership: Ownership::Unowned },
    )
    .with_field(FieldSpec::required("nome", FieldKind::text(1, 200)))
    .with_field(FieldSpec::required("preco", FieldKind::positive_number()))
    .with_field(FieldSpec::optional("categoria", FieldKind::Choice(CATEGORIAS)))
    .with_field(FieldSpec::optional("descricao", FieldKind::text(0, 1000)))
    .with_field(
        FieldSpec::optional("estoque", FieldKind::integer(Some(0), None)).with_default(json!(0)),
    )
}

/// Lines are fixed once the order exists; `total` and `status` belong to
/// the order service.
pub fn pedidos() -> CollectionSchema {
    CollectionSchema::new(
        PEDIDOS,
        AccessPolicy { create_requires_session: true, ownership: Ownership::Creator },
    )
    .with_field(
        FieldSpec::required("itens", FieldKind::List { item: &ITEM_PEDIDO, min_items: 1 })
            .create_only(),
    )
    .with_field(FieldSpec::optional("observacoes", FieldKind::text(0, 500)))
    .with_field(
        FieldSpec::optional(
            "total",
            FieldKind::Number { min: Some(0.0), min_exclusive: false, max: None },
        )
        .read_only(),
    )
    .with_field(
        FieldSpec::optional("status", FieldKind::Choice(STATUS_PEDIDO))
            .with_default(json!(STATUS_PENDENTE))
            .read_only(),
    )
}

pub fn default_schemas() -> Vec<CollectionSchema> {
    vec![usuarios(), tarefas(), produtos(), pedidos()]
}
