//! Conversion of backend errors into JSON-RPC errors.

use cometh_backend::BackendError;
use jsonrpsee::types::{
    ErrorObjectOwned,
    error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE},
};

/// Converts a [`BackendError`] into the error object returned to the caller.
///
/// Errors caused by the request arguments carry the invalid params code. Everything else is
/// an internal error.
pub fn rpc_error(err: BackendError) -> ErrorObjectOwned {
    let code = if err.is_invalid_params() {
        INVALID_PARAMS_CODE
    } else {
        warn!(target: "cometh::rpc", %err, "request failed");
        INTERNAL_ERROR_CODE
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}
