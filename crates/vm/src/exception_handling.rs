//! TRY/CATCH/FINALLY bookkeeping.

/// The phase of a try region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionHandlingState {
    /// Executing the try block.
    Try,
    /// Executing the catch block.
    Catch,
    /// Executing the finally block.
    Finally,
}

/// One entry of a context's try stack. Pointers are absolute script
/// positions; `-1` means absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandlingContext {
    pub catch_pointer: i32,
    pub finally_pointer: i32,
    pub end_pointer: i32,
    pub state: ExceptionHandlingState,
}

impl ExceptionHandlingContext {
    pub fn new(catch_pointer: i32, finally_pointer: i32) -> Self {
        Self {
            catch_pointer,
            finally_pointer,
            end_pointer: -1,
            state: ExceptionHandlingState::Try,
        }
    }

    pub fn has_catch(&self) -> bool {
        self.catch_pointer >= 0
    }

    pub fn has_finally(&self) -> bool {
        self.finally_pointer >= 0
    }
}
