mod mock_link;
mod process;
mod scenarios;
mod shutdown;
