pub mod arcconf;

use crate::exec::ExecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("не удалось разобрать количество контроллеров в строке '{line}'")]
    InvalidControllerCount { line: String },
}
