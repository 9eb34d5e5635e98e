use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Attach the backend-specific primary key column. Postgres generates ids
/// server-side as a fallback, SQLite relies on the application supplying them.
fn add_id_column<T>(
    manager: &SchemaManager,
    table: &mut TableCreateStatement,
    column: T,
) -> Result<(), DbErr>
where
    T: IntoIden,
{
    match manager.get_database_backend() {
        sea_orm::DatabaseBackend::Postgres => {
            table.col(
                ColumnDef::new(column)
                    .uuid()
                    .not_null()
                    .primary_key()
                    .default(Expr::cust("gen_random_uuid()")),
            );
        }
        sea_orm::DatabaseBackend::Sqlite => {
            table.col(ColumnDef::new(column).uuid().not_null().primary_key());
        }
        _ => {
            return Err(DbErr::Custom("Unsupported database backend".to_string()));
        }
    }
    Ok(())
}

fn timestamp_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Products (catalog of intermediate and finished goods)
        let mut products_table = Table::create()
            .table(Products::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Products::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Products::Code).string().not_null())
            .col(ColumnDef::new(Products::Stage).string().not_null())
            .col(ColumnDef::new(Products::Category).string().not_null())
            .col(ColumnDef::new(Products::Line).string().not_null())
            .col(
                ColumnDef::new(Products::Active)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(timestamp_column(Products::CreatedAt))
            .col(timestamp_column(Products::LastUpdated))
            .to_owned();
        add_id_column(manager, &mut products_table, Products::Id)?;
        manager.create_table(products_table).await?;

        // Parameters (named, unit-bearing quality characteristics)
        let mut parameters_table = Table::create()
            .table(Parameters::Table)
            .if_not_exists()
            .col(ColumnDef::new(Parameters::Name).string().not_null())
            .col(ColumnDef::new(Parameters::Unit).string().not_null())
            .col(
                ColumnDef::new(Parameters::InputKind)
                    .string()
                    .not_null()
                    .default("numeric"),
            )
            .col(timestamp_column(Parameters::CreatedAt))
            .col(timestamp_column(Parameters::LastUpdated))
            .to_owned();
        add_id_column(manager, &mut parameters_table, Parameters::Id)?;
        manager.create_table(parameters_table).await?;

        // Product <-> parameter links carrying the spec window
        let mut product_parameters_table = Table::create()
            .table(ProductParameters::Table)
            .if_not_exists()
            .col(ColumnDef::new(ProductParameters::ProductId).uuid().not_null())
            .col(
                ColumnDef::new(ProductParameters::ParameterId)
                    .uuid()
                    .not_null(),
            )
            .col(ColumnDef::new(ProductParameters::MinValue).decimal())
            .col(ColumnDef::new(ProductParameters::TargetValue).decimal())
            .col(ColumnDef::new(ProductParameters::MaxValue).decimal())
            .col(
                ColumnDef::new(ProductParameters::OrderIndex)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(ProductParameters::Required)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(timestamp_column(ProductParameters::CreatedAt))
            .col(timestamp_column(ProductParameters::LastUpdated))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_product_parameters_product_id")
                    .from(ProductParameters::Table, ProductParameters::ProductId)
                    .to(Products::Table, Products::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_product_parameters_parameter_id")
                    .from(ProductParameters::Table, ProductParameters::ParameterId)
                    .to(Parameters::Table, Parameters::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        add_id_column(manager, &mut product_parameters_table, ProductParameters::Id)?;
        manager.create_table(product_parameters_table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_parameters_product_order")
                    .table(ProductParameters::Table)
                    .col(ProductParameters::ProductId)
                    .col(ProductParameters::OrderIndex)
                    .to_owned(),
            )
            .await?;

        // Analysis sessions (one per submitted capture)
        let mut analysis_sessions_table = Table::create()
            .table(AnalysisSessions::Table)
            .if_not_exists()
            .col(ColumnDef::new(AnalysisSessions::StageKind).string().not_null())
            .col(ColumnDef::new(AnalysisSessions::ProductId).uuid().not_null())
            .col(
                ColumnDef::new(AnalysisSessions::OverallStatus)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(AnalysisSessions::CapturedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(AnalysisSessions::Note).text())
            .col(timestamp_column(AnalysisSessions::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_analysis_sessions_product_id")
                    .from(AnalysisSessions::Table, AnalysisSessions::ProductId)
                    .to(Products::Table, Products::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        add_id_column(manager, &mut analysis_sessions_table, AnalysisSessions::Id)?;
        manager.create_table(analysis_sessions_table).await?;

        // Analysis results (one row per captured parameter)
        let mut analysis_results_table = Table::create()
            .table(AnalysisResults::Table)
            .if_not_exists()
            .col(ColumnDef::new(AnalysisResults::SessionId).uuid().not_null())
            .col(ColumnDef::new(AnalysisResults::ParameterId).uuid().not_null())
            .col(ColumnDef::new(AnalysisResults::MeasuredValue).double())
            .col(ColumnDef::new(AnalysisResults::MeasuredText).text())
            .col(ColumnDef::new(AnalysisResults::Unit).string().not_null())
            .col(ColumnDef::new(AnalysisResults::SpecMin).double())
            .col(ColumnDef::new(AnalysisResults::SpecTarget).double())
            .col(ColumnDef::new(AnalysisResults::SpecMax).double())
            .col(ColumnDef::new(AnalysisResults::Status).string().not_null())
            .col(
                ColumnDef::new(AnalysisResults::OrderIndex)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(timestamp_column(AnalysisResults::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_analysis_results_session_id")
                    .from(AnalysisResults::Table, AnalysisResults::SessionId)
                    .to(AnalysisSessions::Table, AnalysisSessions::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        add_id_column(manager, &mut analysis_results_table, AnalysisResults::Id)?;
        manager.create_table(analysis_results_table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_results_session_id")
                    .table(AnalysisResults::Table)
                    .col(AnalysisResults::SessionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(AnalysisResults::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(AnalysisSessions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ProductParameters::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Parameters::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Code,
    Stage,
    Category,
    Line,
    Active,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum Parameters {
    Table,
    Id,
    Name,
    Unit,
    InputKind,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum ProductParameters {
    Table,
    Id,
    ProductId,
    ParameterId,
    MinValue,
    TargetValue,
    MaxValue,
    OrderIndex,
    Required,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum AnalysisSessions {
    Table,
    Id,
    StageKind,
    ProductId,
    OverallStatus,
    CapturedAt,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AnalysisResults {
    Table,
    Id,
    SessionId,
    ParameterId,
    MeasuredValue,
    MeasuredText,
    Unit,
    SpecMin,
    SpecTarget,
    SpecMax,
    Status,
    OrderIndex,
    CreatedAt,
}
