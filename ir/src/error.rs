use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// User-facing errors raised by the expression layer.
///
/// Each is reported at the call that introduced the inconsistency, and the
/// failed operation leaves no partial state behind. Internal invariant
/// breaches are not represented here; they are bugs and panic.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Access arity must equal the order of the accessed tensor.
    #[snafu(display(
        "tensor {tensor} of order {order} must be indexed with {order} variables, but is indexed with: {indices}"
    ))]
    AccessArity { tensor: String, order: usize, indices: String },

    /// A tensor is single-assignment in the IR.
    #[snafu(display("cannot reassign {tensor}: it already has an assignment"))]
    Reassignment { tensor: String },

    /// An index variable is used with disagreeing dimensions.
    #[snafu(display("dimension mismatch in assignment to {tensor}: {conflicts}"))]
    DimensionMismatch { tensor: String, conflicts: String },

    /// A variable used outside any reduction is missing from the free set.
    #[snafu(display("ill-formed assignment {assignment}: {missing} not bound by the result or a reduction"))]
    IllFormed { assignment: String, missing: String },

    /// Result mode order disagrees with an operand's; the lowering would
    /// have to transpose.
    #[snafu(display("assignment to {tensor} requires a transposition, which is not supported"))]
    Transposition { tensor: String },

    /// A free variable indexes no operand; the lowering would have to
    /// broadcast.
    #[snafu(display(
        "assignment to {tensor} distributes over {vars}, which index no operand; distribution is not supported"
    ))]
    Distribution { tensor: String, vars: String },

    /// `+=` needs a result layout that can be updated in place.
    #[snafu(display(
        "cannot accumulate into {tensor}: format \"{format}\" does not admit in-place accumulation"
    ))]
    AccumulationUnsupported { tensor: String, format: String },

    /// Unknown character in a format spec string.
    #[snafu(display("format character not recognized: {found}"))]
    FormatChar { found: char },

    /// Assigning without index variables is only meaningful for scalars.
    #[snafu(display(
        "must use index variables on the left-hand side when assigning to {tensor} of order {order}"
    ))]
    ScalarAssignment { tensor: String, order: usize },
}
