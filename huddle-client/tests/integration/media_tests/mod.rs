mod test_local_stream;
