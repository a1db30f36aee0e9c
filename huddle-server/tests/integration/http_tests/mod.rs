mod test_room_api;
