//! Production account runner

use async_trait::async_trait;
use rewardpilot_domain::{Account, ProxyBinding};

use crate::batch::AccountRunner;
use crate::supervisor::{AccountRunReport, TaskSupervisor};

/// Runs each account through a [`TaskSupervisor`] with its bound proxy.
pub struct SessionRunner {
    supervisor: TaskSupervisor,
    proxies: ProxyBinding,
}

impl SessionRunner {
    #[must_use]
    pub fn new(supervisor: TaskSupervisor, proxies: ProxyBinding) -> Self {
        Self { supervisor, proxies }
    }
}

#[async_trait]
impl AccountRunner for SessionRunner {
    async fn run_account(&self, account: Account) -> AccountRunReport {
        let proxy = self.proxies.proxy_for(account.index).map(str::to_string);
        self.supervisor.run(account, proxy).await
    }
}
