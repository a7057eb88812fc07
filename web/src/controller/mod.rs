pub(crate) mod status_controller;
