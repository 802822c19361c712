pub mod descriptor;
pub mod format;

pub use descriptor::{
    Check, CollapseSpec, Contract, DEFAULT_VALIDATE_MESSAGE, Field, FieldConfig, FieldSpec,
    FieldType, Mutator, RawContract, Validate, normalize,
};
pub use format::{defaults, format_pull, format_push, template};
