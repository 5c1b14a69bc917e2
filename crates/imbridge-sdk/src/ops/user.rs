use imbridge_core::decode::transforms;
use imbridge_core::{Invocation, OperationError, OperationId, Response};

use crate::params::SelfInfoUpdate;
use crate::sdk::Sdk;

type OpResult = Result<Response, OperationError>;

impl Sdk {
    pub async fn logout(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("logout").operation_id(operation_id))
            .await
    }

    /// Login state as reported by the unit (1 logged out, 2 logging in, 3 logged in).
    pub async fn get_login_status(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(
            Invocation::new("getLoginStatus")
                .operation_id(operation_id)
                .transform(transforms::first_element),
        )
        .await
    }

    pub async fn get_login_user_id(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getLoginUserID").operation_id(operation_id))
            .await
    }

    pub async fn get_self_user_info(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("getSelfUserInfo").operation_id(operation_id))
            .await
    }

    pub async fn get_users_info(
        &self,
        user_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("getUsersInfo")
                .operation_id(operation_id)
                .json_arg(user_ids),
        )
        .await
    }

    pub async fn set_self_info(
        &self,
        update: &SelfInfoUpdate,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setSelfInfo")
                .operation_id(operation_id)
                .json_arg(update),
        )
        .await
    }

    pub async fn set_app_background_status(
        &self,
        is_background: bool,
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("setAppBackgroundStatus")
                .operation_id(operation_id)
                .arg(is_background),
        )
        .await
    }

    pub async fn network_status_changed(&self, operation_id: Option<OperationId>) -> OpResult {
        self.invoke(Invocation::new("networkStatusChanged").operation_id(operation_id))
            .await
    }

    pub async fn subscribe_users_status(
        &self,
        user_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("subscribeUsersStatus")
                .operation_id(operation_id)
                .json_arg(user_ids),
        )
        .await
    }

    pub async fn unsubscribe_users_status(
        &self,
        user_ids: &[String],
        operation_id: Option<OperationId>,
    ) -> OpResult {
        self.invoke(
            Invocation::new("unsubscribeUsersStatus")
                .operation_id(operation_id)
                .json_arg(user_ids),
        )
        .await
    }
}
