use super::{GeneratedDocument, GeneratorError};

/// Document generators. Generation is synchronous and may block on the
/// typesetter; async callers move it onto the blocking pool.
pub trait Generator<Req: ?Sized> {
    fn generate(&self, request: &Req) -> Result<GeneratedDocument, GeneratorError>;
}
