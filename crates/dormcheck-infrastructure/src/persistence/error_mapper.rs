use dormcheck_domain::shared::DomainError;

/// Single place where storage errors become domain errors
pub struct RepositoryErrorMapper;

impl RepositoryErrorMapper {
    pub fn map_sqlx_error(err: sqlx::Error, context: &str) -> DomainError {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DomainError::DataIntegrity(format!("{context}: {}", db_err.message()))
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                DomainError::DataIntegrity(format!("{context}: {}", db_err.message()))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DomainError::DataIntegrity(format!("{context}: column {index}: {source}"))
            }
            other => DomainError::Repository(format!("{context}: {other}")),
        }
    }
}
