//! Fallback trigger and action definitions
//!
//! Used when no `TRIGGER.IDS` / `ACTION.IDS` has been loaded. The lines use
//! the same syntax as the game files, so they go through the same parser.

use std::sync::{Arc, OnceLock};

use crate::ids::{IdsTable, normalize_name};

pub const TRIGGER_DEFINITIONS: &str = "\
0x0002 AttackedBy(O:Object*,I:Style*AStyles)
0x0003 Help(O:Object*)
0x0004 Joins(O:Object*)
0x0005 Leaves(O:Object*)
0x0006 ReceivedOrder(O:Object*,I:Order ID*)
0x0007 Said(O:Object*,I:Dialog ID*)
0x0008 TurnedBy(O:Object*)
0x0009 Unusable(S:Item*)
0x0020 HitBy(O:Object*,I:Style*DamageS)
0x0022 TimerExpired(I:ID*)
0x0023 True()
0x004A Heard(O:Object*,I:ID*SHOUTIDS)
0x004C Entered(O:Object*)
0x0052 Opened(O:Object*)
0x0036 OnCreation()
0x400A Alignment(O:Object*,I:Alignment*Align)
0x400B Allegiance(O:Object*,I:Allegiance*EA)
0x400C Class(O:Object*,I:Class*Class)
0x400D Exists(O:Object*)
0x400E General(O:Object*,I:General*General)
0x400F Global(S:Name*,S:Area*,I:Value*)
0x4010 HP(O:Object*,I:Hit Points*)
0x4011 HPGT(O:Object*,I:Hit Points*)
0x4012 HPLT(O:Object*,I:Hit Points*)
0x4013 LOS(O:Object*,I:Range*)
0x4017 Race(O:Object*,I:Race*Race)
0x4018 Range(O:Object*,I:Range*)
0x401C See(O:Object*)
0x401D Specifics(O:Object*,I:Specifics*Specific)
0x401E Time(I:Time*Time)
0x4022 NumTimesTalkedTo(I:Num*)
0x4023 NumTimesTalkedToGT(I:Num*)
0x4024 NumTimesTalkedToLT(I:Num*)
0x402B PartyHasItem(S:Item*)
0x402C InParty(O:Object*)
0x4034 GlobalGT(S:Name*,S:Area*,I:Value*)
0x4035 GlobalLT(S:Name*,S:Area*,I:Value*)
0x4037 StateCheck(O:Object*,I:State*State)
0x4039 GlobalTimerExact(S:Name*,S:Area*)
0x4040 GlobalTimerExpired(S:Name*,S:Area*)
0x4041 GlobalTimerNotExpired(S:Name*,S:Area*)
0x4043 HasItem(S:ResRef*,O:Object*)
0x404D Dead(S:Name*)
0x4051 Detect(O:Object*)
0x4063 InventoryFull(O:Object*)
0x4068 TimeOfDay(I:TimeOfDay*TimeODay)
0x4070 Clicked(O:Object*)
0x4076 OpenState(O:Object*,I:Open*BOOLEAN)
0x4079 HaveSpell(I:Spell*Spell)
0x4079 HaveSpellRES(S:Spell*)
0x4089 OR(I:OrCount*)
0x40A5 BitGlobal(S:Name*,S:Area*,I:Value*,I:Mode*BitMode)
0x40E0 NearLocation(O:Object*,P:Location*,I:Range*)
";

pub const ACTION_DEFINITIONS: &str = "\
0 NoAction()
1 ActionOverride(O:Actor*,A:Action*)
3 Attack(O:Target*)
7 CreateCreature(S:NewObject*,P:Location*,I:Face*)
8 Dialogue(O:Object*)
10 Enemy()
22 MoveToObject(O:Target*)
23 MoveToPoint(P:Point*)
29 RunAwayFrom(O:Creature*,I:Time*)
30 SetGlobal(S:Name*,S:Area*,I:Value*)
31 Spell(O:Target*,I:Spell*Spell)
31 SpellRES(S:RES*,O:Target*)
34 UseItem(S:Object*,O:Target*)
36 Continue()
40 PlayDead(I:Time*)
49 MoveViewPoint(P:Target*,I:ScrollSpeed*Scroll)
61 StartTimer(I:ID*,I:Time*)
63 Wait(I:Time*)
83 SmallWait(I:Time*)
85 RandomWalk()
86 SetInterrupt(I:State*Boolean)
95 SpellPoint(P:Target*,I:Spell*Spell)
95 SpellPointRES(S:RES*,P:Target*)
101 Help()
106 Shout(I:ID*SHOUTIDS)
109 IncrementGlobal(S:Name*,S:Area*,I:Value*)
111 DestroySelf()
113 ForceSpell(O:Target*,I:Spell*Spell)
113 ForceSpellRES(S:RES*,O:Target*)
114 ForceSpellPoint(P:Target*,I:Spell*Spell)
114 ForceSpellPointRES(S:RES*,P:Target*)
115 SetGlobalTimer(S:Name*,S:Area*,I:Time*GTimes)
120 StartCutScene(S:CutScene*)
121 StartCutSceneMode()
122 EndCutSceneMode()
127 CutSceneId(O:Object*)
137 StartDialogueNoSet(O:Object*)
143 OpenDoor(O:Object*)
144 CloseDoor(O:Object*)
168 DisplayStringHead(O:Object*,I:StrRef*)
184 SetNumTimesTalkedTo(I:Num*)
202 FadeToColor(P:Point*,I:Blue*)
203 FadeFromColor(P:Point*,I:Blue*)
207 MoveToPointNoInterrupt(P:Point*)
225 MoveBetweenAreas(S:Area*,P:Location*,I:Face*)
227 CreateCreatureObject(S:ResRef*,O:Object*,I:Usage1*,I:Usage2*,I:Usage3*)
243 IncrementGlobalOnce(S:Name*,S:Area*,S:Global*,S:GArea*,I:Value*)
254 ScreenShake(P:Point*,I:Duration*)
268 RealSetGlobalTimer(S:Name*,S:Area*,I:Time*GTimes)
272 CreateVisualEffect(S:Object*,P:Location*)
294 SpellCastEffect(O:Source*,S:Voice*,S:Sound1*,I:Sound2*)
308 SetGlobalTimerRandom(S:Name*,S:Area*,I:Min*,I:Max*)
309 SetGlobalTimerOnce(S:Name*,S:Area*,I:Time*GTimes)
";

/// Symbols every script needs even without game IDS files
const EA_SYMBOLS: &str = "\
0 ANYONE
1 INANIMATE
2 PC
3 FAMILIAR
4 ALLY
5 CONTROLLED
6 CHARMED
28 GOODBUTRED
29 GOODBUTBLUE
30 GOODCUTOFF
31 NOTGOOD
126 ANYTHING
127 NEUTRAL
128 NOTEVIL
199 EVILCUTOFF
200 EVILBUTGREEN
201 EVILBUTBLUE
255 ENEMY
";

const OBJECT_SYMBOLS: &str = "\
0 Nothing
1 Myself
2 LeaderOf
3 GroupOf
4 WeakestOf
5 StrongestOf
6 MostDamagedOf
7 LeastDamagedOf
8 ProtectedBy
9 ProtectorOf
10 LastAttackerOf
11 LastTargetedBy
12 NearestEnemyOf
13 LastCommandedBy
14 Nearest
15 LastHitter
16 LastHeardBy
17 LastSeenBy
18 LastTalkedToBy
19 LastHelp
20 LastTrigger
21 Player1
22 Player2
23 Player3
24 Player4
25 Player5
26 Player6
27 Protagonist
";

/// Built-in fallback for the `EA` and `OBJECT` tables
pub fn symbol_table(name: &str) -> Option<Arc<IdsTable>> {
    static EA: OnceLock<Arc<IdsTable>> = OnceLock::new();
    static OBJECT: OnceLock<Arc<IdsTable>> = OnceLock::new();
    match normalize_name(name).as_str() {
        "EA" => Some(EA.get_or_init(|| Arc::new(IdsTable::parse("EA", EA_SYMBOLS))).clone()),
        "OBJECT" => Some(
            OBJECT
                .get_or_init(|| Arc::new(IdsTable::parse("OBJECT", OBJECT_SYMBOLS)))
                .clone(),
        ),
        _ => None,
    }
}
