mod tools;
pub mod arith;
pub mod huffman;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file read error: {0}")]
    FileRead(#[source] std::io::Error),
    #[error("file write error: {0}")]
    FileWrite(#[source] std::io::Error),
    #[error("file too large")]
    FileTooLarge,
    #[error("bad compression stream")]
    BadCompressionStream,
    #[error("method not supported")]
    UnsupportedMethod
}

/// Compress `path_in` to `path_out` with the named method,
/// either `arith` or `huffman`.
pub fn compress_file(method: &str,path_in: &str,path_out: &str) -> Result<(),Error> {
    let dat = std::fs::read(path_in).map_err(Error::FileRead)?;
    let compressed: Vec<u8> = match method {
        "arith" => arith::compress(&dat)?,
        "huffman" => huffman::compress(&dat),
        _ => return Err(Error::UnsupportedMethod)
    };
    std::fs::write(path_out,compressed).map_err(Error::FileWrite)?;
    Ok(())
}

/// Expand `path_in` to `path_out` with the named method,
/// either `arith` or `huffman`.
pub fn expand_file(method: &str,path_in: &str,path_out: &str) -> Result<(),Error> {
    let dat = std::fs::read(path_in).map_err(Error::FileRead)?;
    let expanded: Vec<u8> = match method {
        "arith" => arith::expand(&dat)?,
        "huffman" => huffman::expand(&dat)?,
        _ => return Err(Error::UnsupportedMethod)
    };
    std::fs::write(path_out,expanded).map_err(Error::FileWrite)?;
    Ok(())
}
