/// Turn a `-1` returned by a libc function into the corresponding
/// [`std::io::Error`]; any other value passes through unchanged.
pub fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> std::io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(std::io::Error::last_os_error()),
        _ => Ok(res),
    }
}

#[cfg(test)]
mod test {
    use super::cerr;

    #[test]
    fn minus_one_is_an_error() {
        assert!(cerr(-1i32).is_err());
        assert_eq!(cerr(0i32).unwrap(), 0);
        assert_eq!(cerr(42i64).unwrap(), 42);
    }

    #[test]
    fn errno_is_attached() {
        let err = cerr(unsafe { libc::close(-1) }).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
