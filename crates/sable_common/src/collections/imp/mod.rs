pub(crate) mod raw_buf;
