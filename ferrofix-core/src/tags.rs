/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! FIX tag numbers used by the session layer.
//!
//! Only the tags the engine itself reads or writes are named here;
//! application-level tags travel through the engine untyped.

/// BeginString (FIX version).
pub const BEGIN_STRING: u32 = 8;
/// BodyLength, computed over the body after tag 9 and before tag 10.
pub const BODY_LENGTH: u32 = 9;
/// CheckSum, mod-256 sum formatted as three decimal digits.
pub const CHECK_SUM: u32 = 10;
/// MsgSeqNum.
pub const MSG_SEQ_NUM: u32 = 34;
/// MsgType.
pub const MSG_TYPE: u32 = 35;
/// NewSeqNo, carried by SequenceReset.
pub const NEW_SEQ_NO: u32 = 36;
/// PossDupFlag.
pub const POSS_DUP_FLAG: u32 = 43;
/// RefSeqNum, carried by session-level Reject.
pub const REF_SEQ_NUM: u32 = 45;
/// SenderCompID.
pub const SENDER_COMP_ID: u32 = 49;
/// SenderSubID.
pub const SENDER_SUB_ID: u32 = 50;
/// SendingTime.
pub const SENDING_TIME: u32 = 52;
/// TargetCompID.
pub const TARGET_COMP_ID: u32 = 56;
/// TargetSubID.
pub const TARGET_SUB_ID: u32 = 57;
/// Text, free-form reason on Logout and Reject.
pub const TEXT: u32 = 58;
/// BeginSeqNo, carried by ResendRequest.
pub const BEGIN_SEQ_NO: u32 = 7;
/// EndSeqNo, carried by ResendRequest; 0 means "up to latest".
pub const END_SEQ_NO: u32 = 16;
/// EncryptMethod, sent on Logon.
pub const ENCRYPT_METHOD: u32 = 98;
/// HeartBtInt, negotiated on Logon.
pub const HEART_BT_INT: u32 = 108;
/// TestReqID, correlates TestRequest and the answering Heartbeat.
pub const TEST_REQ_ID: u32 = 112;
/// OrigSendingTime, set on PossDup retransmissions.
pub const ORIG_SENDING_TIME: u32 = 122;
/// GapFillFlag, distinguishes SequenceReset-GapFill from Reset.
pub const GAP_FILL_FLAG: u32 = 123;
/// ResetSeqNumFlag, sent on Logon when sequence numbers restart at 1.
pub const RESET_SEQ_NUM_FLAG: u32 = 141;
/// SenderLocationID.
pub const SENDER_LOCATION_ID: u32 = 142;
/// TargetLocationID.
pub const TARGET_LOCATION_ID: u32 = 143;
/// RefTagID, carried by session-level Reject.
pub const REF_TAG_ID: u32 = 371;
/// RefMsgType, carried by session-level Reject.
pub const REF_MSG_TYPE: u32 = 372;
/// SessionRejectReason code.
pub const SESSION_REJECT_REASON: u32 = 373;
/// Password, injected on Logon by the application hook.
pub const PASSWORD: u32 = 554;
