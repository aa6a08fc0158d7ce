pub mod api;

use crate::agent::WingmanAgent;
use crate::cli::Args;
use std::error::Error;

pub struct Server {
    addr: String,
    agent: WingmanAgent,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: WingmanAgent, args: Args) -> Self {
        Self {
            addr,
            agent,
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.agent.clone(), self.args.clone()).await
    }
}
